//! The messaging service seam.
//!
//! Search and scrape only talk to a [`MessagingClient`]. Connection handling,
//! login, pagination and flood waits all live behind it, in
//! [`TelegramClient`](crate::TelegramClient) for real runs and in a scripted
//! double for tests.

use async_trait::async_trait;

use crate::Result;
use crate::models::{Conversation, Identity, Message};

/// A lazily pulled, newest-first sequence of messages.
///
/// Each call to [`next_message`](Self::next_message) may hit the network.
/// Dropping the cursor abandons the rest of the sequence.
#[async_trait(?Send)]
pub trait MessageCursor {
    /// Pull the next message, or `None` once the sequence is exhausted.
    async fn next_message(&mut self) -> Result<Option<Message>>;
}

/// Boxed cursor returned by client calls.
pub type BoxedCursor = Box<dyn MessageCursor>;

/// Whether `connect` reused a stored session or had to log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A stored session was loaded.
    Resumed,
    /// No session existed; a new one was created and saved.
    Created,
}

/// Operations consumed from the messaging service.
#[async_trait(?Send)]
pub trait MessagingClient {
    /// Backend reference attached to each listed conversation.
    type Handle: Clone;

    /// Open the connection, logging in if no stored session exists.
    async fn connect(&mut self) -> Result<SessionState>;

    /// Close the connection and persist the session.
    async fn disconnect(&mut self) -> Result<()>;

    /// All conversations visible to the current account, in service order.
    async fn list_conversations(&mut self) -> Result<Vec<Conversation<Self::Handle>>>;

    /// Server-side keyword search inside one conversation.
    async fn search_in_conversation(
        &mut self,
        conversation: &Conversation<Self::Handle>,
        query: &str,
        limit: usize,
    ) -> Result<BoxedCursor>;

    /// Iterate a conversation by ID, newest first. `None` means no limit.
    async fn iterate_messages(&mut self, chat_id: i64, limit: Option<usize>)
    -> Result<BoxedCursor>;

    /// The logged-in account.
    async fn current_identity(&mut self) -> Result<Identity>;
}
