//! Configuration types and loading for the application.

use std::path::Path;

use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::write_default_config;
use crate::{AppPaths, env_prefix};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Active configuration profile.
    pub profile: String,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Runtime behavior configuration.
    pub runtime: RuntimeConfig,

    /// Custom data directory.
    pub paths: PathsConfig,

    /// Telegram API credentials and session settings.
    pub telegram: TelegramConfig,

    /// Search limits.
    pub search: SearchConfig,
}

impl AppConfig {
    /// Load configuration from file and environment, creating defaults if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed, or written.
    pub fn load(paths: &AppPaths) -> Result<Self> {
        if !paths.config_file.exists() {
            write_default_config(&paths.config_file)?;
        }

        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn load_from_path(config_file: &Path) -> Result<Self> {
        let env_prefix = env_prefix();
        let built = Config::builder()
            .set_default("profile", "default")?
            .set_default("logging.level", "warn")?
            .set_default("runtime.timeout", 60_i64)?
            .set_default("telegram.session", "anon")?
            .set_default("search.per_chat_limit", 100_i64)?
            .set_default("search.max_text_chars", 500_i64)?
            .add_source(
                File::from(config_file)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(Environment::with_prefix(env_prefix.as_str()).separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            logging: LoggingConfig::default(),
            runtime: RuntimeConfig::default(),
            paths: PathsConfig::default(),
            telegram: TelegramConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given.
    pub level: LogLevel,
}

/// Log level enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only emit error-level messages.
    Error,
    /// Emit warnings and errors (default).
    #[default]
    Warn,
    /// Emit informational messages and above.
    Info,
    /// Emit debug diagnostics and above.
    Debug,
    /// Emit all messages including fine-grained traces.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Runtime behavior configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Seconds to wait for the connection and login handshake (default: 60).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { timeout: Some(60) }
    }
}

/// Path override configuration.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory for persistent data. Supports ~ and environment variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

/// Telegram credentials and session settings.
///
/// `api_id` and `api_hash` are fallbacks for `--api-id`/`--api-hash` and
/// `TELEGRAM_API_ID`/`TELEGRAM_API_HASH`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// API ID from my.telegram.org.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,

    /// API hash from my.telegram.org.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_hash: Option<String>,

    /// Session name; the session file is `<session>.session`.
    pub session: String,

    /// Directory holding session files (default: the data directory).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_dir: Option<String>,

    /// Phone number used for first login instead of prompting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_id: None,
            api_hash: None,
            session: "anon".to_string(),
            session_dir: None,
            phone: None,
        }
    }
}

/// Search limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum hits requested per conversation.
    pub per_chat_limit: usize,
    /// Maximum characters of message text kept per hit.
    pub max_text_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_chat_limit: 100,
            max_text_chars: 500,
        }
    }
}

/// Why API credentials could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Either value is missing everywhere.
    #[error("TELEGRAM_API_ID and TELEGRAM_API_HASH must be set")]
    Missing,
    /// The API ID is not a number.
    #[error("TELEGRAM_API_ID must be an integer")]
    NotAnInteger,
}

impl CredentialError {
    /// Follow-up line printed after the error, if any.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Missing => {
                Some("Set them as environment variables or pass --api-id and --api-hash")
            }
            Self::NotAnInteger => None,
        }
    }
}

/// Resolved Telegram API credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Numeric API ID.
    pub api_id: i32,
    /// API hash.
    pub api_hash: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_hash", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Pick credentials from the command line (flag or environment, already
    /// merged by the argument parser), falling back to the config file.
    /// Empty strings count as missing.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Missing` if either value is absent and
    /// `CredentialError::NotAnInteger` if the API ID does not parse.
    pub fn resolve(
        api_id: Option<&str>,
        api_hash: Option<&str>,
        cfg: &TelegramConfig,
    ) -> std::result::Result<Self, CredentialError> {
        let present = |s: &&str| !s.trim().is_empty();
        let api_id = api_id
            .filter(present)
            .or_else(|| cfg.api_id.as_deref().filter(present));
        let api_hash = api_hash
            .filter(present)
            .or_else(|| cfg.api_hash.as_deref().filter(present));

        let (Some(api_id), Some(api_hash)) = (api_id, api_hash) else {
            return Err(CredentialError::Missing);
        };

        let api_id = api_id
            .trim()
            .parse::<i32>()
            .map_err(|_| CredentialError::NotAnInteger)?;

        Ok(Self {
            api_id,
            api_hash: api_hash.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = AppConfig::load_from_path(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(cfg.telegram.session, "anon");
        assert_eq!(cfg.search, SearchConfig::default());
        assert_eq!(cfg.runtime.timeout, Some(60));
        assert_eq!(cfg.logging.level, LogLevel::Warn);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            concat!(
                "[telegram]\napi_id = 12345\napi_hash = \"abc\"\nsession = \"work\"\n",
                "\n[search]\nper_chat_limit = 20\n",
            ),
        )
        .expect("write config");

        let cfg = AppConfig::load_from_path(&path).expect("load");
        assert_eq!(cfg.telegram.api_id.as_deref(), Some("12345"));
        assert_eq!(cfg.telegram.session, "work");
        assert_eq!(cfg.search.per_chat_limit, 20);
        assert_eq!(cfg.search.max_text_chars, 500);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tgs").join("config.toml");
        write_default_config(&path).expect("write default");
        let body = fs::read_to_string(&path).expect("read");
        assert!(body.starts_with("# Configuration for tgs"));
        assert!(body.contains("[telegram]"));
        assert!(!body.contains("state_dir"));
        assert!(!body.contains("$schema"));
        let cfg = AppConfig::load_from_path(&path).expect("load");
        assert_eq!(cfg.telegram.session, "anon");
    }

    #[test]
    fn command_line_wins_over_config() {
        let cfg = TelegramConfig {
            api_id: Some("1".into()),
            api_hash: Some("from-file".into()),
            ..TelegramConfig::default()
        };
        let creds = Credentials::resolve(Some("42"), Some("from-flag"), &cfg).expect("resolve");
        assert_eq!(creds.api_id, 42);
        assert_eq!(creds.api_hash, "from-flag");
    }

    #[test]
    fn config_fills_in_missing_values() {
        let cfg = TelegramConfig {
            api_id: Some("7".into()),
            api_hash: Some("hash".into()),
            ..TelegramConfig::default()
        };
        let creds = Credentials::resolve(None, Some(""), &cfg).expect("resolve");
        assert_eq!(creds.api_id, 7);
        assert_eq!(creds.api_hash, "hash");
    }

    #[test]
    fn missing_either_value_is_reported() {
        let cfg = TelegramConfig::default();
        assert_eq!(
            Credentials::resolve(Some("1"), None, &cfg),
            Err(CredentialError::Missing)
        );
        assert_eq!(
            Credentials::resolve(None, Some("hash"), &cfg),
            Err(CredentialError::Missing)
        );
        assert!(CredentialError::Missing.hint().is_some());
    }

    #[test]
    fn non_numeric_api_id_is_reported() {
        let err = Credentials::resolve(Some("12ab"), Some("hash"), &TelegramConfig::default())
            .expect_err("not a number");
        assert_eq!(err, CredentialError::NotAnInteger);
        assert_eq!(err.to_string(), "TELEGRAM_API_ID must be an integer");
    }

    #[test]
    fn debug_output_hides_the_hash() {
        let creds = Credentials {
            api_id: 1,
            api_hash: "secret".into(),
        };
        assert!(!format!("{creds:?}").contains("secret"));
    }
}
