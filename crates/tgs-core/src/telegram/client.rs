//! MTProto client built on `grammers`.
//!
//! Dialog listing, server-side search and history iteration are all lazy
//! `grammers` iterators; they are wrapped as [`MessageCursor`]s so callers can
//! stop pulling (and stop issuing requests) at any point.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, LocalBoxStream, StreamExt};
use grammers_client::types::{Media, Message as TgMessage, User};
use grammers_client::{Client, Config, InitParams};
use grammers_session::PackedChat;

use crate::client::{BoxedCursor, MessageCursor, MessagingClient, SessionState};
use crate::models::{Conversation, Identity, Message};
use crate::telegram::auth;
use crate::telegram::storage::SessionStorage;
use crate::{CoreError, Credentials, Result};

/// Telegram client.
pub struct TelegramClient {
    credentials: Credentials,
    storage: SessionStorage,
    phone: Option<String>,
    connect_timeout: Option<Duration>,
    client: Option<Client>,
    me: Option<User>,
    chats: HashMap<i64, PackedChat>,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("credentials", &self.credentials)
            .field("storage", &self.storage)
            .field("connected", &self.client.is_some())
            .field("known_chats", &self.chats.len())
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a disconnected client.
    ///
    /// `phone` is used for first login instead of prompting.
    #[must_use]
    pub fn new(
        credentials: Credentials,
        storage: SessionStorage,
        phone: Option<String>,
        connect_timeout: Option<Duration>,
    ) -> Self {
        Self {
            credentials,
            storage,
            phone,
            connect_timeout,
            client: None,
            me: None,
            chats: HashMap::new(),
        }
    }

    /// Where the session is stored.
    #[must_use]
    pub const fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    fn connected(&self) -> Result<Client> {
        self.client
            .clone()
            .ok_or_else(|| CoreError::Client("not connected".to_string()))
    }

    async fn open(&self) -> Result<Client> {
        let config = Config {
            session: self.storage.load()?,
            api_id: self.credentials.api_id,
            api_hash: self.credentials.api_hash.clone(),
            params: InitParams::default(),
        };

        let connecting = Client::connect(config);
        let connected = match self.connect_timeout {
            Some(limit) => tokio::time::timeout(limit, connecting).await.map_err(|_| {
                CoreError::Timeout(format!("connecting to Telegram after {}s", limit.as_secs()))
            })?,
            None => connecting.await,
        };
        connected.map_err(|e| CoreError::Client(format!("connecting to Telegram: {e}")))
    }

    async fn me(&mut self) -> Result<User> {
        if let Some(ref me) = self.me {
            return Ok(me.clone());
        }
        let client = self.connected()?;
        let me = client
            .get_me()
            .await
            .map_err(|e| CoreError::Client(format!("fetching current user: {e}")))?;
        self.me = Some(me.clone());
        Ok(me)
    }

    async fn resolve_chat(&mut self, chat_id: i64) -> Result<PackedChat> {
        let me = self.me().await?;
        if me.id() == chat_id {
            return Ok(me.pack());
        }
        if !self.chats.contains_key(&chat_id) {
            self.list_conversations().await?;
        }
        self.chats
            .get(&chat_id)
            .copied()
            .ok_or_else(|| CoreError::Client(format!("chat {chat_id} is not in the dialog list")))
    }
}

#[async_trait(?Send)]
impl MessagingClient for TelegramClient {
    type Handle = PackedChat;

    async fn connect(&mut self) -> Result<SessionState> {
        let fresh = !self.storage.exists();
        if fresh {
            eprintln!("[INFO] No existing session found. Starting authentication...");
        } else {
            eprintln!("[INFO] Using existing session...");
        }

        let client = self.open().await?;
        let authorized = client
            .is_authorized()
            .await
            .map_err(|e| CoreError::Client(format!("checking authorization: {e}")))?;

        let state = if authorized {
            SessionState::Resumed
        } else {
            let user = auth::sign_in(&client, self.phone.as_deref()).await?;
            log::info!("signed in as user {}", user.id());
            self.storage.save(client.session())?;
            eprintln!(
                "[INFO] Session saved. You can now use this client without re-authenticating."
            );
            self.me = Some(user);
            SessionState::Created
        };

        self.client = Some(client);
        Ok(state)
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            self.storage.save(client.session())?;
            log::debug!("session saved to {}", self.storage.path().display());
        }
        self.me = None;
        self.chats.clear();
        Ok(())
    }

    async fn list_conversations(&mut self) -> Result<Vec<Conversation<PackedChat>>> {
        let client = self.connected()?;
        let mut dialogs = client.iter_dialogs();
        let mut conversations = Vec::new();

        while let Some(dialog) = dialogs
            .next()
            .await
            .map_err(|e| CoreError::Client(format!("listing dialogs: {e}")))?
        {
            let chat = dialog.chat();
            let packed = chat.pack();
            self.chats.insert(chat.id(), packed);
            conversations.push(Conversation {
                id: chat.id(),
                title: Some(chat.name().to_string()),
                handle: packed,
            });
        }

        log::debug!("listed {} dialogs", conversations.len());
        Ok(conversations)
    }

    async fn search_in_conversation(
        &mut self,
        conversation: &Conversation<PackedChat>,
        query: &str,
        limit: usize,
    ) -> Result<BoxedCursor> {
        let client = self.connected()?;
        let iter = client
            .search_messages(conversation.handle)
            .query(query)
            .limit(limit);

        let messages = stream::unfold(Some(iter), |state| async move {
            let mut iter = state?;
            match iter.next().await {
                Ok(Some(message)) => Some((Ok(convert(&message)), Some(iter))),
                Ok(None) => None,
                Err(e) => Some((Err(CoreError::Client(format!("searching: {e}"))), None)),
            }
        });
        Ok(Box::new(StreamCursor {
            inner: messages.boxed_local(),
        }))
    }

    async fn iterate_messages(
        &mut self,
        chat_id: i64,
        limit: Option<usize>,
    ) -> Result<BoxedCursor> {
        let packed = self.resolve_chat(chat_id).await?;
        let client = self.connected()?;
        let mut iter = client.iter_messages(packed);
        if let Some(limit) = limit {
            iter = iter.limit(limit);
        }

        let messages = stream::unfold(Some(iter), |state| async move {
            let mut iter = state?;
            match iter.next().await {
                Ok(Some(message)) => Some((Ok(convert(&message)), Some(iter))),
                Ok(None) => None,
                Err(e) => Some((Err(CoreError::Client(format!("reading history: {e}"))), None)),
            }
        });
        Ok(Box::new(StreamCursor {
            inner: messages.boxed_local(),
        }))
    }

    async fn current_identity(&mut self) -> Result<Identity> {
        let me = self.me().await?;
        Ok(Identity {
            user_id: me.id(),
            first_name: non_empty(me.first_name()),
            last_name: me.last_name().and_then(non_empty),
            username: me.username().and_then(non_empty),
            phone: me.phone().and_then(non_empty),
        })
    }
}

/// Cursor over a local stream of converted messages.
struct StreamCursor {
    inner: LocalBoxStream<'static, Result<Message>>,
}

#[async_trait(?Send)]
impl MessageCursor for StreamCursor {
    async fn next_message(&mut self) -> Result<Option<Message>> {
        self.inner.next().await.transpose()
    }
}

fn convert(message: &TgMessage) -> Message {
    Message {
        id: i64::from(message.id()),
        text: message.text().to_string(),
        timestamp: Some(message.date().fixed_offset()),
        sender_id: message.sender().map(|sender| sender.id()),
        outgoing: message.outgoing(),
        media_kind: message.media().as_ref().map(media_kind),
    }
}

fn media_kind(media: &Media) -> String {
    variant_name(&format!("{media:?}")).to_string()
}

/// Leading identifier of a `Debug` rendering, i.e. the enum variant name.
fn variant_name(debug: &str) -> &str {
    let end = debug
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(debug.len());
    &debug[..end]
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
