//! Mutation and query API.
//!
//! Every mutation bumps the Clock Marker *before* touching the records, so
//! a crash between the two writes can only make the marker look newer than
//! the data (a redundant push later, never a lost update).

use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::metrics;
use crate::notify::SyncNotice;
use crate::record::{FollowRecord, FollowSource};
use crate::storage::traits::SortOrder;

use super::FollowSync;

impl FollowSync {
    /// Follow (or refresh) an entity.
    ///
    /// On the first mutation of a session with no Clock Marker, a blocking
    /// reconciliation runs first; if it fails the record is not written and
    /// [`SyncError::InitialSync`] is returned. Existing records with the same
    /// id are replaced wholesale.
    pub async fn add_or_update(&self, source: &FollowSource) -> Result<FollowRecord, SyncError> {
        self.ensure_accepting()?;
        self.note_session_start().await?;

        if self.store.clock_marker().await?.is_none() {
            if let Err(e) = self.reconcile().await {
                warn!(error = %e, id = %source.id, "Initial sync failed, follow not saved");
                self.notifier.emit(SyncNotice::SyncFailed { reason: e.to_string() });
                return Err(SyncError::InitialSync(Box::new(e)));
            }
        }

        let now = self.clock.now_millis();
        self.store.set_clock_marker(now).await?;

        let record = FollowRecord::from_source(source, now);
        let replaced = self.store.upsert(&record).await?;
        metrics::record_mutation("add");
        debug!(id = %record.id, replaced, "Follow saved");

        self.schedule_push();
        Ok(record)
    }

    /// Unfollow `id`. Absent ids still bump the marker and schedule a push.
    pub async fn delete(&self, id: &str) -> Result<(), SyncError> {
        self.ensure_accepting()?;
        self.note_session_start().await?;

        self.store.set_clock_marker(self.clock.now_millis()).await?;
        self.store.delete(id).await?;
        metrics::record_mutation("delete");
        debug!(id = %id, "Follow removed");

        self.schedule_push();
        Ok(())
    }

    /// Drop every follow. The next push uploads an empty collection.
    pub async fn clear(&self) -> Result<(), SyncError> {
        self.ensure_accepting()?;
        self.note_session_start().await?;

        self.store.set_clock_marker(self.clock.now_millis()).await?;
        self.store.clear().await?;
        metrics::record_mutation("clear");
        metrics::set_record_count(0);
        info!("Follow list cleared");
        self.notifier.emit(SyncNotice::Cleared);

        self.schedule_push();
        Ok(())
    }

    /// Number of follows in the local store.
    pub async fn count(&self) -> Result<u64, SyncError> {
        let count = self.store.count().await?;
        metrics::set_record_count(count);
        Ok(count)
    }

    /// Page `page_index` of follows, newest first.
    ///
    /// No snapshot isolation across pages: a mutation between two calls
    /// can shift records from one page to the next.
    pub async fn page(&self, page_index: usize) -> Result<Vec<FollowRecord>, SyncError> {
        let limit = self.config.page_limit;
        let offset = (page_index as u64).saturating_mul(limit as u64);
        Ok(self.store.page_by_time(SortOrder::Descending, offset, limit).await?)
    }

    /// Whether `id` is followed.
    pub async fn exists(&self, id: &str) -> Result<bool, SyncError> {
        Ok(self.store.exists(id).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Option<FollowRecord>, SyncError> {
        Ok(self.store.get(id).await?)
    }

    /// Last local modification time, if any.
    pub async fn clock_marker(&self) -> Result<Option<i64>, SyncError> {
        Ok(self.store.clock_marker().await?)
    }
}
