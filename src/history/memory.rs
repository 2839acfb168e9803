//! In-process history store.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    HISTORY_CAPACITY, HistoryError, HistoryRecord, HistoryStore, NewHistoryRecord, count_to_i64,
    current_timestamp,
};

#[derive(Debug, Default)]
struct Inner {
    // Most recent at the front.
    records: VecDeque<HistoryRecord>,
    next_id: i64,
}

/// History store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    inner: Mutex<Inner>,
}

impl MemoryHistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, record: NewHistoryRecord) -> Result<HistoryRecord, HistoryError> {
        let image_count = count_to_i64(record.image_count)?;
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let stored = HistoryRecord {
            id: inner.next_id,
            timestamp: current_timestamp(),
            source: record.source,
            keywords: record.keywords,
            image_count,
        };
        inner.records.push_front(stored.clone());
        inner.records.truncate(HISTORY_CAPACITY);
        Ok(stored)
    }

    async fn read_all(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self.inner.lock().await.records.iter().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_caps_and_orders() {
        let store = MemoryHistoryStore::new();
        for i in 0..105 {
            store
                .append(NewHistoryRecord::new("Google", format!("k{i}"), 1))
                .await
                .unwrap();
        }
        let records = store.read_all().await.unwrap();
        assert_eq!(records.len(), 100);
        assert_eq!(records[0].keywords, "k104");
        assert_eq!(records[99].keywords, "k5");
    }
}
