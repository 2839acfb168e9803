//! Persisted, capped log of completed batches.
//!
//! The orchestrator only sees the [`HistoryStore`] trait. Two stores ship
//! with the crate: [`SqliteHistoryStore`] for durable storage and
//! [`MemoryHistoryStore`] for tests and sessions without a database.
//! Both keep at most [`HISTORY_CAPACITY`] records and return them most
//! recent first.

mod error;
mod memory;
mod sqlite;

pub use error::HistoryError;
pub use memory::MemoryHistoryStore;
pub use sqlite::SqliteHistoryStore;

use async_trait::async_trait;
use chrono::Local;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum number of records kept; older ones are evicted first.
pub const HISTORY_CAPACITY: usize = 100;

/// Fixed storage namespace for history records.
pub const HISTORY_NAMESPACE: &str = "image_downloader_history";

/// Timestamp format stored with each record.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One completed batch, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryRecord {
    /// Store-assigned identifier; larger means newer.
    pub id: i64,
    /// Human-readable local time of completion.
    pub timestamp: String,
    /// Source label (`Google`, `Pixabay`, `Footy Renders`).
    pub source: String,
    /// Keyword or team input of the batch.
    pub keywords: String,
    /// Images actually obtained.
    pub image_count: i64,
}

/// A record to append; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryRecord {
    pub source: String,
    pub keywords: String,
    pub image_count: usize,
}

impl NewHistoryRecord {
    #[must_use]
    pub fn new(source: impl Into<String>, keywords: impl Into<String>, image_count: usize) -> Self {
        Self {
            source: source.into(),
            keywords: keywords.into(),
            image_count,
        }
    }
}

/// Durable history storage.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends a record, evicting the oldest ones beyond capacity.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if the record cannot be stored.
    async fn append(&self, record: NewHistoryRecord) -> Result<HistoryRecord, HistoryError>;

    /// Returns every stored record, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError`] if storage cannot be read.
    async fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryError>;
}

pub(crate) fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn count_to_i64(count: usize) -> Result<i64, HistoryError> {
    i64::try_from(count).map_err(|_| HistoryError::InvalidCount { count })
}
