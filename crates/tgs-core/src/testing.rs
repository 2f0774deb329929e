//! Scripted `MessagingClient` used by unit tests.

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use crate::client::{BoxedCursor, MessageCursor, MessagingClient, SessionState};
use crate::models::{Conversation, Identity, Message};
use crate::{CoreError, Result};

/// One element of a scripted message sequence.
#[derive(Debug, Clone)]
pub enum Step {
    Msg(Message),
    Fail(&'static str),
}

/// A scripted sequence, or a failure to open it.
pub type Script = std::result::Result<Vec<Step>, &'static str>;

#[derive(Debug, Default)]
pub struct ScriptedClient {
    pub conversations: Vec<Conversation<()>>,
    pub searches: HashMap<i64, Script>,
    pub history: HashMap<i64, Script>,
    pub identity: Option<Identity>,
    pub fail_connect: Option<&'static str>,
    pub fail_list: Option<&'static str>,
    pub stall_on_list: bool,

    pub connects: usize,
    pub disconnects: usize,
    pub lists: usize,
    pub searches_opened: usize,
    pub iterations_opened: usize,
    pub identity_lookups: usize,
    pub pulled: Rc<Cell<usize>>,
}

impl ScriptedClient {
    pub fn with_identity(user_id: i64) -> Self {
        Self {
            identity: Some(Identity {
                user_id,
                first_name: Some("Ada".into()),
                last_name: None,
                username: Some("ada".into()),
                phone: None,
            }),
            ..Self::default()
        }
    }

    pub fn add_conversation(&mut self, id: i64, title: &str, search: Script) {
        self.conversations.push(Conversation {
            id,
            title: (!title.is_empty()).then(|| title.to_string()),
            handle: (),
        });
        self.searches.insert(id, search);
    }

    fn open(&self, script: Option<&Script>) -> Result<BoxedCursor> {
        match script {
            Some(Ok(steps)) => Ok(Box::new(ScriptedCursor {
                steps: steps.clone().into_iter(),
                pulled: Rc::clone(&self.pulled),
            })),
            Some(Err(e)) => Err(CoreError::Client((*e).to_string())),
            None => Ok(Box::new(ScriptedCursor {
                steps: Vec::new().into_iter(),
                pulled: Rc::clone(&self.pulled),
            })),
        }
    }
}

struct ScriptedCursor {
    steps: std::vec::IntoIter<Step>,
    pulled: Rc<Cell<usize>>,
}

#[async_trait(?Send)]
impl MessageCursor for ScriptedCursor {
    async fn next_message(&mut self) -> Result<Option<Message>> {
        match self.steps.next() {
            Some(Step::Msg(m)) => {
                self.pulled.set(self.pulled.get() + 1);
                Ok(Some(m))
            }
            Some(Step::Fail(e)) => Err(CoreError::Client(e.to_string())),
            None => Ok(None),
        }
    }
}

#[async_trait(?Send)]
impl MessagingClient for ScriptedClient {
    type Handle = ();

    async fn connect(&mut self) -> Result<SessionState> {
        self.connects += 1;
        match self.fail_connect {
            Some(e) => Err(CoreError::Auth(e.to_string())),
            None => Ok(SessionState::Resumed),
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.disconnects += 1;
        Ok(())
    }

    async fn list_conversations(&mut self) -> Result<Vec<Conversation<()>>> {
        self.lists += 1;
        if self.stall_on_list {
            std::future::pending::<()>().await;
        }
        match self.fail_list {
            Some(e) => Err(CoreError::Client(e.to_string())),
            None => Ok(self.conversations.clone()),
        }
    }

    async fn search_in_conversation(
        &mut self,
        conversation: &Conversation<()>,
        _query: &str,
        _limit: usize,
    ) -> Result<BoxedCursor> {
        self.searches_opened += 1;
        self.open(self.searches.get(&conversation.id))
    }

    async fn iterate_messages(
        &mut self,
        chat_id: i64,
        _limit: Option<usize>,
    ) -> Result<BoxedCursor> {
        self.iterations_opened += 1;
        self.open(self.history.get(&chat_id))
    }

    async fn current_identity(&mut self) -> Result<Identity> {
        self.identity_lookups += 1;
        self.identity
            .clone()
            .ok_or_else(|| CoreError::Client("not logged in".into()))
    }
}

/// UTC timestamp for `y-m-d h:m:s` plus `micros`.
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, micros: u32) -> DateTime<FixedOffset> {
    let naive = NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_micro_opt(h, min, s, micros))
        .expect("valid test timestamp");
    FixedOffset::east_opt(0)
        .expect("utc offset")
        .from_utc_datetime(&naive)
}

pub fn msg(id: i64, text: &str, timestamp: Option<DateTime<FixedOffset>>) -> Message {
    Message {
        id,
        text: text.to_string(),
        timestamp,
        sender_id: Some(1000 + id),
        outgoing: false,
        media_kind: None,
    }
}
