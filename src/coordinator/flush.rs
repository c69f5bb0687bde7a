//! Upload and debounced push scheduling.

use std::sync::atomic::Ordering;
use tokio::time::Instant;
use tracing::{info, warn, debug};

use crate::batching::debounce::{FlushReason, PendingPush};
use crate::error::SyncError;
use crate::metrics::{self, LatencyTimer};
use crate::notify::SyncNotice;

use super::{FollowSync, PushReport};

impl FollowSync {
    /// Upload the whole local collection, replacing the remote copy.
    ///
    /// Best effort: a failure leaves local state ahead of remote until the
    /// next successful push or reconciliation, and never rolls back the
    /// mutation that scheduled it.
    #[tracing::instrument(skip(self))]
    pub async fn push(&self) -> Result<PushReport, SyncError> {
        let _in_flight = self.push_lock.lock().await;
        let _timer = LatencyTimer::new("push");

        let records = self.store.all().await?;
        let marker = self.store.clock_marker().await?.unwrap_or(0);
        let payload = self.codec.encode(marker, &records)?;
        let bytes = payload.len();

        let result = async {
            let token = self.credential().await?;
            self.remote.store(&token, payload).await.map_err(SyncError::from)
        }
        .await;

        match result {
            Ok(()) => {
                metrics::record_push("success");
                metrics::record_push_bytes(bytes);
                info!(records = records.len(), bytes, marker, "Follow list uploaded");
                Ok(PushReport {
                    records: records.len(),
                    bytes,
                    marker,
                })
            }
            Err(e) => {
                metrics::record_push("error");
                warn!(error = %e, "Follow list upload failed, local is ahead of remote");
                Err(e)
            }
        }
    }

    /// Register a mutation with the debouncer and wake the push loop.
    ///
    /// The first burst of a session that opened on an empty store is marked
    /// skippable; it is dropped only if the store is still empty when it fires.
    pub(super) fn schedule_push(&self) {
        let first = !self.scheduled_once.swap(true, Ordering::SeqCst);
        let opened_empty = self.opened_empty.get().copied().unwrap_or(false);
        let skip = first && self.config.skip_fresh_empty_push && opened_empty;

        {
            let mut debouncer = self.debouncer.lock();
            debouncer.schedule(Instant::now());
            if skip {
                debouncer.mark_skip();
            }
        }
        if skip {
            debug!("Session opened on an empty store, first push skipped unless records appear");
        }

        self.wake.notify_one();
    }

    /// Fire the pending push now, ignoring the quiet period and ceiling.
    ///
    /// Returns `Ok(None)` when nothing was pending or the burst was skipped.
    pub async fn flush_pending(&self) -> Result<Option<PushReport>, SyncError> {
        let pending = self.debouncer.lock().force_flush(Instant::now());
        match pending {
            Some(pending) => self.execute_pending(pending).await,
            None => Ok(None),
        }
    }

    /// Fire the pending push if its deadline has passed.
    pub(super) async fn fire_due_push(&self) {
        let pending = self.debouncer.lock().take_if_due(Instant::now());
        if let Some(pending) = pending {
            // Failure is already logged and counted; surface it to the UI
            if let Err(e) = self.execute_pending(pending).await {
                self.notifier.emit(SyncNotice::SyncFailed { reason: e.to_string() });
            }
        }
    }

    pub(super) async fn flush_with_reason(&self, reason: FlushReason) -> Result<Option<PushReport>, SyncError> {
        let pending = self.debouncer.lock().force_flush_with_reason(Instant::now(), reason);
        match pending {
            Some(pending) => self.execute_pending(pending).await,
            None => Ok(None),
        }
    }

    async fn execute_pending(&self, pending: PendingPush) -> Result<Option<PushReport>, SyncError> {
        metrics::record_push_coalesced(pending.calls);

        // Outside a fresh-empty burst an empty store is still pushed; that is how a clear propagates
        let count = self.store.count().await?;
        if pending.skip && count == 0 {
            metrics::record_push_skipped("fresh_empty");
            info!(calls = pending.calls, "Skipping push for empty fresh session");
            return Ok(None);
        }

        debug!(count, calls = pending.calls, reason = %pending.reason, "Debounced push firing");
        self.notifier.emit(SyncNotice::UploadStarted);

        self.push().await.map(Some)
    }
}
