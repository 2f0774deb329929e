//! Data models shared by the search and scrape workflows.
//!
//! Conversations and messages are read-only snapshots handed out by a
//! [`MessagingClient`](crate::MessagingClient). Records and envelopes are the
//! serializable projections written to stdout.

use chrono::{DateTime, FixedOffset, SecondsFormat, Timelike};
use serde::Serialize;

/// A chat, group, or channel visible to the current account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation<H> {
    /// Numeric chat ID.
    pub id: i64,
    /// Display title, if the service provides one.
    pub title: Option<String>,
    /// Backend-specific reference used to address the chat.
    pub handle: H,
}

impl<H> Conversation<H> {
    /// Title shown in search results, falling back to `Chat <id>`.
    #[must_use]
    pub fn display_title(&self) -> String {
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Chat {}", self.id),
        }
    }
}

/// A single message snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message ID, unique within its chat.
    pub id: i64,
    /// Plain text body. Empty for media-only or service messages.
    pub text: String,
    /// Send time, if known.
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// ID of the sending user or chat.
    pub sender_id: Option<i64>,
    /// Whether the current account sent this message.
    pub outgoing: bool,
    /// Name of the attached media variant (`Photo`, `Document`, ...).
    pub media_kind: Option<String>,
}

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// User ID. Also the ID of the account's Saved Messages chat.
    pub user_id: i64,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Public username without the leading `@`.
    pub username: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Chat the message was found in.
    pub chat_id: i64,
    /// Chat title (or `Chat <id>`).
    pub chat_title: String,
    /// Message ID.
    pub message_id: i64,
    /// Message text, truncated.
    pub text: String,
    /// ISO-8601 send time.
    pub date: Option<String>,
    /// Sender ID.
    pub sender_id: Option<i64>,
}

impl MatchRecord {
    /// Project a message found in `conversation`, keeping at most
    /// `max_chars` characters of text. Returns `None` for empty messages.
    #[must_use]
    pub fn from_message<H>(
        conversation: &Conversation<H>,
        message: &Message,
        max_chars: usize,
    ) -> Option<Self> {
        if message.text.is_empty() {
            return None;
        }
        Some(Self {
            chat_id: conversation.id,
            chat_title: conversation.display_title(),
            message_id: message.id,
            text: message.text.chars().take(max_chars).collect(),
            date: message.timestamp.as_ref().map(iso8601),
            sender_id: message.sender_id,
        })
    }
}

/// A Saved Messages entry that falls inside the requested day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeRecord {
    /// Message ID.
    pub message_id: i64,
    /// Full message text, empty when absent.
    pub text: String,
    /// ISO-8601 send time.
    pub date: String,
    /// `true` when the message was not sent by this account.
    pub is_read: bool,
    /// Media variant name, if any.
    pub media_type: Option<String>,
}

impl ScrapeRecord {
    /// Project a message with a known send time.
    #[must_use]
    pub fn from_message(message: &Message, timestamp: &DateTime<FixedOffset>) -> Self {
        Self {
            message_id: message.id,
            text: message.text.clone(),
            date: iso8601(timestamp),
            // Heuristic: there is no read receipt for Saved Messages.
            is_read: !message.outgoing,
            media_type: message.media_kind.clone(),
        }
    }
}

/// What an envelope's results were collected for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Search keywords.
    Query(String),
    /// Scraped calendar day (`YYYY-MM-DD`).
    Date(String),
}

/// Result envelope: either a scoped result list or a reported error.
///
/// `total` always equals the number of results; it is computed here and
/// cannot be supplied by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<R> {
    #[serde(flatten)]
    scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    results: Vec<R>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<usize>,
}

impl<R> Envelope<R> {
    /// Successful envelope for `scope`.
    #[must_use]
    pub fn report(scope: Scope, results: Vec<R>) -> Self {
        let total = results.len();
        Self {
            scope: Some(scope),
            error: None,
            results,
            total: Some(total),
        }
    }

    /// Reported failure with an empty result list.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            scope: None,
            error: Some(message.into()),
            results: Vec::new(),
            total: None,
        }
    }

    /// Collected results.
    #[must_use]
    pub fn results(&self) -> &[R] {
        &self.results
    }

    /// Result count, absent on error envelopes.
    #[must_use]
    pub const fn total(&self) -> Option<usize> {
        self.total
    }

    /// Error message, if this is an error envelope.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Scope of a successful envelope.
    #[must_use]
    pub const fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }
}

/// Output of `--auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthStatus {
    /// Always `authenticated`.
    pub status: &'static str,
    /// The logged-in account.
    pub user: Identity,
    /// Where the session is persisted.
    pub session_file: String,
}

/// Top-level failure report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Error message.
    pub error: String,
    /// Error kind name.
    pub error_type: String,
}

impl From<&crate::CoreError> for ErrorReport {
    fn from(e: &crate::CoreError) -> Self {
        Self {
            error: e.message(),
            error_type: e.kind().to_string(),
        }
    }
}

/// Anything a completed action prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    /// `--auth` result.
    Auth(AuthStatus),
    /// `--whoami` result.
    Identity(Identity),
    /// `--search` result.
    Search(Envelope<MatchRecord>),
    /// `--scrape-saved` result.
    Scrape(Envelope<ScrapeRecord>),
}

/// Render a timestamp as ISO-8601 with a `+HH:MM` offset.
/// Fractional seconds appear only when non-zero, as microseconds.
#[must_use]
pub fn iso8601(ts: &DateTime<FixedOffset>) -> String {
    let format = if ts.nanosecond() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    ts.to_rfc3339_opts(format, false)
}
