//! Core library for tgs - Telegram search from the terminal.
//!
//! This crate provides:
//! - Configuration loading and credential resolution
//! - XDG-compliant path resolution
//! - The `MessagingClient` seam and its Telegram (MTProto) implementation
//! - Cross-chat search and date-window scraping of Saved Messages
//! - Guarded dispatch that always releases the connection
//! - Common types and error handling

pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod paths;
pub mod scrape;
pub mod search;
pub mod telegram;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{BoxedCursor, MessageCursor, MessagingClient};
pub use config::{
    AppConfig, CredentialError, Credentials, LogLevel, LoggingConfig, PathsConfig, RuntimeConfig,
    SearchConfig, TelegramConfig,
};
pub use dispatch::{Action, Outcome, run_guarded};
pub use error::{CoreError, Result};
pub use models::{
    AuthStatus, Conversation, Envelope, ErrorReport, Identity, MatchRecord, Message, Payload,
    ScrapeRecord,
};
pub use paths::{AppPaths, default_data_dir};
pub use scrape::{DayWindow, scrape_by_date};
pub use search::{SearchLimits, search};
pub use telegram::TelegramClient;

/// Application name used for config directories and environment prefix.
pub const APP_NAME: &str = "tgs";

/// Returns the environment variable prefix for this application.
#[must_use]
pub fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
