//! SQLite-backed history store.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::db::Database;

use super::{
    HISTORY_CAPACITY, HISTORY_NAMESPACE, HistoryError, HistoryRecord, HistoryStore,
    NewHistoryRecord, count_to_i64, current_timestamp,
};

/// History store persisted in the `history` table, scoped by namespace.
#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    db: Database,
    namespace: String,
    capacity: usize,
}

impl SqliteHistoryStore {
    /// Creates a store over an open database using the default namespace.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self::with_namespace(db, HISTORY_NAMESPACE)
    }

    /// Creates a store with a custom namespace.
    #[must_use]
    pub fn with_namespace(db: Database, namespace: impl Into<String>) -> Self {
        Self {
            db,
            namespace: namespace.into(),
            capacity: HISTORY_CAPACITY,
        }
    }

    /// Opens (or creates) the database at `path` and wraps it.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Database`] if the database cannot be opened.
    pub async fn open(path: &Path) -> Result<Self, HistoryError> {
        Ok(Self::new(Database::new(path).await?))
    }

    fn capacity_i64(&self) -> i64 {
        i64::try_from(self.capacity).unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    async fn append(&self, record: NewHistoryRecord) -> Result<HistoryRecord, HistoryError> {
        let image_count = count_to_i64(record.image_count)?;
        let timestamp = current_timestamp();

        let mut tx = self.db.pool().begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO history (namespace, timestamp, source, keywords, image_count) \
             VALUES (?, ?, ?, ?, ?) RETURNING seq",
        )
        .bind(&self.namespace)
        .bind(&timestamp)
        .bind(&record.source)
        .bind(&record.keywords)
        .bind(image_count)
        .fetch_one(&mut *tx)
        .await?;

        let evicted = sqlx::query(
            "DELETE FROM history WHERE namespace = ? AND seq NOT IN \
             (SELECT seq FROM history WHERE namespace = ? ORDER BY seq DESC LIMIT ?)",
        )
        .bind(&self.namespace)
        .bind(&self.namespace)
        .bind(self.capacity_i64())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        debug!(id, evicted, "history record appended");

        Ok(HistoryRecord {
            id,
            timestamp,
            source: record.source,
            keywords: record.keywords,
            image_count,
        })
    }

    #[instrument(skip(self), fields(namespace = %self.namespace))]
    async fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let records = sqlx::query_as::<_, HistoryRecord>(
            "SELECT seq AS id, timestamp, source, keywords, image_count FROM history \
             WHERE namespace = ? ORDER BY seq DESC LIMIT ?",
        )
        .bind(&self.namespace)
        .bind(self.capacity_i64())
        .fetch_all(self.db.pool())
        .await?;
        Ok(records)
    }
}
