//! Error types for the core library.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A configuration-related error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A path resolution or validation error.
    #[error("path error: {0}")]
    Path(String),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Login or session error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// A request to the messaging service failed.
    #[error("client error: {0}")]
    Client(String),

    /// An operation did not finish in time.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A generic error for other cases.
    #[error("error: {0}")]
    Other(String),
}

impl CoreError {
    /// Short type name reported as `error_type` in top-level error output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::Path(_) => "PathError",
            Self::Io(_) => "IoError",
            Self::Serialization(_) => "SerializationError",
            Self::Auth(_) => "AuthError",
            Self::Client(_) => "ClientError",
            Self::Timeout(_) => "TimeoutError",
            Self::Other(_) => "Error",
        }
    }

    /// The underlying message without the category prefix used by `Display`.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Config(msg)
            | Self::Path(msg)
            | Self::Serialization(msg)
            | Self::Auth(msg)
            | Self::Client(msg)
            | Self::Timeout(msg)
            | Self::Other(msg) => msg.clone(),
            Self::Io(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_each_variant() {
        assert_eq!(CoreError::Client("x".into()).kind(), "ClientError");
        assert_eq!(CoreError::Timeout("x".into()).kind(), "TimeoutError");
        let io = CoreError::from(std::io::Error::other("disk"));
        assert_eq!(io.kind(), "IoError");
    }

    #[test]
    fn display_keeps_inner_message() {
        let err = CoreError::Auth("PHONE_CODE_INVALID".into());
        assert_eq!(err.to_string(), "authentication error: PHONE_CODE_INVALID");
    }

    #[test]
    fn message_drops_the_category() {
        let err = CoreError::Client("reading history: connection reset".into());
        assert_eq!(err.message(), "reading history: connection reset");
        let io = CoreError::from(std::io::Error::other("disk full"));
        assert_eq!(io.message(), "disk full");
    }
}
