// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use async_trait::async_trait;
use crate::record::FollowRecord;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Record already exists: {0}")]
    Duplicate(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Sort order for [`LocalStore::page_by_time`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Keyed persistent table of follow records plus the Clock Marker.
///
/// The Clock Marker is persisted independently of the records.
/// [`replace_all`](LocalStore::replace_all) is the only operation that
/// writes both, and it does so in one transaction.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<FollowRecord>, StorageError>;

    /// Insert a new record. Fails with [`StorageError::Duplicate`] if `id` exists.
    async fn add(&self, record: &FollowRecord) -> Result<(), StorageError>;

    /// Replace the record stored under `id`, returning how many matched (0 or 1).
    ///
    /// Changing the id onto one that is already taken fails with
    /// [`StorageError::Duplicate`] and leaves both records untouched.
    async fn update(&self, id: &str, record: &FollowRecord) -> Result<u64, StorageError>;

    /// Remove `id`. Absent ids are not an error.
    async fn delete(&self, id: &str) -> Result<(), StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;

    /// Every record, in no particular order.
    async fn all(&self) -> Result<Vec<FollowRecord>, StorageError>;

    /// Records sorted by `time`, skipping `offset` and returning at most `limit`.
    async fn page_by_time(
        &self,
        order: SortOrder,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<FollowRecord>, StorageError>;

    /// Atomically discard every record, insert `records`, and set the Clock
    /// Marker to `marker`. Either all of it is visible afterwards or none of it.
    async fn replace_all(&self, records: &[FollowRecord], marker: i64) -> Result<(), StorageError>;

    /// Last local modification time, if one was ever recorded.
    async fn clock_marker(&self) -> Result<Option<i64>, StorageError>;

    async fn set_clock_marker(&self, marker: i64) -> Result<(), StorageError>;

    /// Update-then-add. Returns `true` if an existing record was replaced.
    async fn upsert(&self, record: &FollowRecord) -> Result<bool, StorageError> {
        if self.update(&record.id, record).await? > 0 {
            return Ok(true);
        }
        self.add(record).await?;
        Ok(false)
    }

    async fn exists(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.get(id).await?.is_some())
    }
}
