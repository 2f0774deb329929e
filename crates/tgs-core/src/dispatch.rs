//! Runs one action inside a connect/disconnect bracket.
//!
//! The action future races an interrupt future. Whichever finishes first,
//! the connection is closed exactly once before the outcome is returned.

use std::future::Future;

use log::{debug, warn};

use crate::client::{MessagingClient, SessionState};
use crate::models::{AuthStatus, ErrorReport, Payload};
use crate::scrape::scrape_by_date;
use crate::search::{SearchLimits, search};
use crate::Result;

/// The single action an invocation performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Log in (or resume) and report the account plus session location.
    Authenticate {
        /// Session file shown in the output.
        session_file: String,
    },
    /// Report the current account.
    WhoAmI,
    /// Keyword search across chats.
    Search {
        /// Search keywords.
        query: String,
        /// Restrict the search to this chat.
        chat_id: Option<i64>,
        /// Per-run limits.
        limits: SearchLimits,
    },
    /// Collect one day of Saved Messages.
    ScrapeByDate {
        /// Day as `YYYY-MM-DD`.
        date: String,
    },
}

/// How a guarded run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action produced output. Error envelopes are completions too.
    Completed(Payload),
    /// An error escaped the action.
    Failed(ErrorReport),
    /// The interrupt future fired first.
    Interrupted,
}

impl Outcome {
    /// Whether the process should exit with a failure status.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Connect, run `action`, and disconnect, racing `interrupt`.
///
/// `disconnect` runs exactly once on every path, including a failed
/// connect and an interrupt. A failing disconnect is logged and does not
/// change the outcome.
pub async fn run_guarded<C, I>(client: &mut C, action: &Action, interrupt: I) -> Outcome
where
    C: MessagingClient,
    I: Future<Output = ()>,
{
    let outcome = tokio::select! {
        result = execute(client, action) => match result {
            Ok(payload) => Outcome::Completed(payload),
            Err(e) => {
                debug!("action failed: {e}");
                Outcome::Failed(ErrorReport::from(&e))
            }
        },
        () = interrupt => Outcome::Interrupted,
    };

    if let Err(e) = client.disconnect().await {
        warn!("disconnect failed: {e}");
    }
    outcome
}

async fn execute<C: MessagingClient>(client: &mut C, action: &Action) -> Result<Payload> {
    match client.connect().await? {
        SessionState::Resumed => debug!("resumed stored session"),
        SessionState::Created => debug!("created new session"),
    }

    match action {
        Action::Authenticate { session_file } => {
            let user = client.current_identity().await?;
            Ok(Payload::Auth(AuthStatus {
                status: "authenticated",
                user,
                session_file: session_file.clone(),
            }))
        }
        Action::WhoAmI => Ok(Payload::Identity(client.current_identity().await?)),
        Action::Search {
            query,
            chat_id,
            limits,
        } => Ok(Payload::Search(search(client, query, *chat_id, *limits).await?)),
        Action::ScrapeByDate { date } => Ok(Payload::Scrape(scrape_by_date(client, date).await?)),
    }
}
