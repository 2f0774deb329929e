//! Keyword search across conversations.
//!
//! Matching itself is done server-side by the messaging service. This module
//! picks the conversations to ask, collects the hits in order, and keeps going
//! when a single conversation refuses the request (left channels, restricted
//! chats, and so on).

use log::debug;

use crate::client::{BoxedCursor, MessagingClient};
use crate::models::{Conversation, Envelope, MatchRecord, Scope};
use crate::{Result, SearchConfig};

/// Per-run search limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum hits requested from each conversation.
    pub per_chat: usize,
    /// Maximum characters of message text kept per hit.
    pub max_text_chars: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            per_chat: 100,
            max_text_chars: 500,
        }
    }
}

impl From<&SearchConfig> for SearchLimits {
    fn from(cfg: &SearchConfig) -> Self {
        Self {
            per_chat: cfg.per_chat_limit,
            max_text_chars: cfg.max_text_chars,
        }
    }
}

/// Search `query` in every conversation, or only in `chat_id` when given.
///
/// An unknown `chat_id` yields an error envelope without any search request.
///
/// # Errors
///
/// Returns an error only if the conversation list cannot be fetched.
/// Failures inside individual conversations are skipped.
pub async fn search<C: MessagingClient>(
    client: &mut C,
    query: &str,
    chat_id: Option<i64>,
    limits: SearchLimits,
) -> Result<Envelope<MatchRecord>> {
    let mut conversations = client.list_conversations().await?;

    if let Some(id) = chat_id {
        conversations.retain(|c| c.id == id);
        if conversations.is_empty() {
            return Ok(Envelope::error(format!("Chat ID {id} not found")));
        }
    }

    let mut results = Vec::new();
    for conversation in &conversations {
        if let Err(e) = search_one(client, conversation, query, limits, &mut results).await {
            debug!("skipping chat {}: {e}", conversation.id);
        }
    }

    Ok(Envelope::report(Scope::Query(query.to_string()), results))
}

/// Append the hits from one conversation. Hits pulled before a failure stay
/// in `results`.
async fn search_one<C: MessagingClient>(
    client: &mut C,
    conversation: &Conversation<C::Handle>,
    query: &str,
    limits: SearchLimits,
    results: &mut Vec<MatchRecord>,
) -> Result<()> {
    let mut cursor: BoxedCursor = client
        .search_in_conversation(conversation, query, limits.per_chat)
        .await?;

    while let Some(message) = cursor.next_message().await? {
        if let Some(record) =
            MatchRecord::from_message(conversation, &message, limits.max_text_chars)
        {
            results.push(record);
        }
    }
    Ok(())
}
