//! Error types for history storage.

use thiserror::Error;

use crate::db::DbError;

/// Errors raised by a [`super::HistoryStore`].
#[derive(Debug, Error)]
pub enum HistoryError {
    /// A query against the history table failed.
    #[error("history storage query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// The history database could not be opened.
    #[error("history database unavailable: {0}\n  Suggestion: Check `history_db` in the config file or pass --history-db")]
    Database(#[from] DbError),

    /// An image count did not fit the storage column.
    #[error("image count {count} cannot be stored")]
    InvalidCount { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_count_display() {
        let msg = HistoryError::InvalidCount { count: 7 }.to_string();
        assert!(msg.contains('7'));
    }
}
