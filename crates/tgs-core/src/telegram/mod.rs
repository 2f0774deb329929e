//! Telegram backend for the `MessagingClient` seam.
//!
//! This module provides:
//! - Session file storage
//! - Interactive login (phone, code, 2FA password)
//! - An MTProto client built on `grammers`

pub mod auth;
pub mod client;
pub mod storage;

pub use client::TelegramClient;
pub use storage::SessionStorage;
