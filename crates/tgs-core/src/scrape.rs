//! One-day scrape of the Saved Messages chat.
//!
//! History arrives newest first, so the scan skips anything newer than the
//! requested day and stops at the first message older than it.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::client::MessagingClient;
use crate::models::{Envelope, ScrapeRecord, Scope};
use crate::{CoreError, Result};

/// Error text for a date that is not `YYYY-MM-DD`.
pub const INVALID_DATE: &str = "Invalid date format. Use YYYY-MM-DD";

/// Inclusive wall-clock bounds of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    /// `00:00:00.000000` of the day.
    pub start: NaiveDateTime,
    /// `23:59:59.999999` of the day.
    pub end: NaiveDateTime,
}

/// Where a timestamp falls relative to a [`DayWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Newer than the window.
    After,
    /// Inside the window.
    Within,
    /// Older than the window.
    Before,
}

impl DayWindow {
    /// Parse a `YYYY-MM-DD` date into its day window.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` if `date` is not a valid calendar date.
    pub fn parse(date: &str) -> Result<Self> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| CoreError::Config(format!("invalid date {date:?}: {e}")))?;
        let last = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
            .ok_or_else(|| CoreError::Other("end-of-day time out of range".to_string()))?;
        Ok(Self {
            start: day.and_time(NaiveTime::MIN),
            end: day.and_time(last),
        })
    }

    /// Classify a wall-clock timestamp.
    #[must_use]
    pub fn position(&self, ts: NaiveDateTime) -> Position {
        if ts < self.start {
            Position::Before
        } else if ts > self.end {
            Position::After
        } else {
            Position::Within
        }
    }
}

/// Collect every Saved Messages entry sent on `date` (`YYYY-MM-DD`).
///
/// A malformed date or a failure while reading history yields an error
/// envelope; results gathered before a read failure are dropped.
///
/// # Errors
///
/// Returns an error only if the current account cannot be looked up.
pub async fn scrape_by_date<C: MessagingClient>(
    client: &mut C,
    date: &str,
) -> Result<Envelope<ScrapeRecord>> {
    let Ok(window) = DayWindow::parse(date) else {
        return Ok(Envelope::error(INVALID_DATE));
    };

    let me = client.current_identity().await?;

    match collect_day(client, me.user_id, &window).await {
        Ok(results) => Ok(Envelope::report(Scope::Date(date.to_string()), results)),
        Err(e) => Ok(Envelope::error(format!(
            "Failed to scrape Saved Messages: {}",
            e.message()
        ))),
    }
}

async fn collect_day<C: MessagingClient>(
    client: &mut C,
    chat_id: i64,
    window: &DayWindow,
) -> Result<Vec<ScrapeRecord>> {
    let mut cursor = client.iterate_messages(chat_id, None).await?;
    let mut results = Vec::new();

    while let Some(message) = cursor.next_message().await? {
        let Some(ts) = message.timestamp else {
            continue;
        };
        match window.position(ts.naive_local()) {
            Position::Within => results.push(ScrapeRecord::from_message(&message, &ts)),
            Position::Before => break,
            Position::After => {}
        }
    }

    log::debug!("scraped {} messages from chat {chat_id}", results.len());
    Ok(results)
}
