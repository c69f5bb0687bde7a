// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use crate::record::FollowRecord;
use super::traits::{LocalStore, SortOrder, StorageError};

#[derive(Default)]
struct State {
    records: HashMap<String, FollowRecord>,
    marker: Option<i64>,
}

/// In-process store. Records and marker share one lock so a replace is
/// never observed half-applied.
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Get current record count
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.read().records.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocalStore for InMemoryStore {
    async fn get(&self, id: &str) -> Result<Option<FollowRecord>, StorageError> {
        Ok(self.state.read().records.get(id).cloned())
    }

    async fn add(&self, record: &FollowRecord) -> Result<(), StorageError> {
        let mut state = self.state.write();
        if state.records.contains_key(&record.id) {
            return Err(StorageError::Duplicate(record.id.clone()));
        }
        state.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, id: &str, record: &FollowRecord) -> Result<u64, StorageError> {
        let mut state = self.state.write();
        if !state.records.contains_key(id) {
            return Ok(0);
        }
        if record.id != id && state.records.contains_key(&record.id) {
            return Err(StorageError::Duplicate(record.id.clone()));
        }
        state.records.remove(id);
        state.records.insert(record.id.clone(), record.clone());
        Ok(1)
    }

    async fn delete(&self, id: &str) -> Result<(), StorageError> {
        self.state.write().records.remove(id);
        Ok(())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.state.read().records.len() as u64)
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.state.write().records.clear();
        Ok(())
    }

    async fn all(&self) -> Result<Vec<FollowRecord>, StorageError> {
        Ok(self.state.read().records.values().cloned().collect())
    }

    async fn page_by_time(
        &self,
        order: SortOrder,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<FollowRecord>, StorageError> {
        let mut records: Vec<FollowRecord> = self.state.read().records.values().cloned().collect();
        // Tie-break on id so pages are deterministic
        records.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.id.cmp(&b.id)));
        if order == SortOrder::Descending {
            records.reverse();
        }
        Ok(records
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .collect())
    }

    async fn replace_all(&self, records: &[FollowRecord], marker: i64) -> Result<(), StorageError> {
        let fresh: HashMap<String, FollowRecord> = records
            .iter()
            .map(|r| (r.id.clone(), r.clone()))
            .collect();
        let mut state = self.state.write();
        state.records = fresh;
        state.marker = Some(marker);
        Ok(())
    }

    async fn clock_marker(&self) -> Result<Option<i64>, StorageError> {
        Ok(self.state.read().marker)
    }

    async fn set_clock_marker(&self, marker: i64) -> Result<(), StorageError> {
        self.state.write().marker = Some(marker);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, time: i64) -> FollowRecord {
        FollowRecord {
            id: id.to_string(),
            name: format!("user {}", id),
            bio: String::new(),
            url: String::new(),
            time,
        }
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
        assert_eq!(store.clock_marker().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let store = InMemoryStore::new();
        store.add(&record("a", 1)).await.unwrap();

        let result = store.get("a").await.unwrap();
        assert_eq!(result.unwrap().time, 1);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_duplicate_fails() {
        let store = InMemoryStore::new();
        store.add(&record("a", 1)).await.unwrap();

        let result = store.add(&record("a", 2)).await;
        assert!(matches!(result, Err(StorageError::Duplicate(id)) if id == "a"));
    }

    #[tokio::test]
    async fn test_update_reports_match_count() {
        let store = InMemoryStore::new();
        assert_eq!(store.update("a", &record("a", 1)).await.unwrap(), 0);

        store.add(&record("a", 1)).await.unwrap();
        assert_eq!(store.update("a", &record("a", 9)).await.unwrap(), 1);
        assert_eq!(store.get("a").await.unwrap().unwrap().time, 9);
    }

    #[tokio::test]
    async fn test_update_onto_taken_id_is_duplicate() {
        let store = InMemoryStore::new();
        store.add(&record("a", 1)).await.unwrap();
        store.add(&record("b", 2)).await.unwrap();

        let result = store.update("a", &record("b", 3)).await;
        assert!(matches!(result, Err(StorageError::Duplicate(id)) if id == "b"));
        assert_eq!(store.get("a").await.unwrap().unwrap().time, 1);
        assert_eq!(store.get("b").await.unwrap().unwrap().time, 2);

        // Renaming onto a free id moves the record
        assert_eq!(store.update("a", &record("c", 4)).await.unwrap(), 1);
        assert!(store.get("a").await.unwrap().is_none());
        assert_eq!(store.get("c").await.unwrap().unwrap().time, 4);
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_replaces() {
        let store = InMemoryStore::new();
        assert!(!store.upsert(&record("a", 1)).await.unwrap());
        assert!(store.upsert(&record("a", 2)).await.unwrap());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_nonexistent_is_ok() {
        let store = InMemoryStore::new();
        assert!(store.delete("nonexistent").await.is_ok());
    }

    #[tokio::test]
    async fn test_clear_keeps_marker() {
        let store = InMemoryStore::new();
        store.set_clock_marker(10).await.unwrap();
        for i in 0..5 {
            store.add(&record(&format!("r{}", i), i)).await.unwrap();
        }

        store.clear().await.unwrap();

        assert!(store.is_empty());
        assert_eq!(store.clock_marker().await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn test_page_by_time_descending() {
        let store = InMemoryStore::new();
        for i in 0..10 {
            store.add(&record(&format!("r{}", i), i)).await.unwrap();
        }

        let page = store.page_by_time(SortOrder::Descending, 2, 3).await.unwrap();
        let times: Vec<i64> = page.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![7, 6, 5]);

        let asc = store.page_by_time(SortOrder::Ascending, 0, 2).await.unwrap();
        assert_eq!(asc[0].time, 0);

        let past_end = store.page_by_time(SortOrder::Descending, 50, 10).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_replace_all_swaps_records_and_marker() {
        let store = InMemoryStore::new();
        store.add(&record("old", 1)).await.unwrap();
        store.set_clock_marker(1).await.unwrap();

        store
            .replace_all(&[record("new-1", 5), record("new-2", 6)], 77)
            .await
            .unwrap();

        assert!(!store.exists("old").await.unwrap());
        assert!(store.exists("new-1").await.unwrap());
        assert_eq!(store.len(), 2);
        assert_eq!(store.clock_marker().await.unwrap(), Some(77));
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        use std::sync::Arc;

        let store = Arc::new(InMemoryStore::new());
        let mut handles = vec![];

        for batch in 0..10 {
            let store_clone = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..10 {
                    let r = record(&format!("batch-{}-item-{}", batch, i), i);
                    store_clone.upsert(&r).await.unwrap();
                }
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 100);
    }
}
