//! Pull-or-push reconciliation.
//!
//! Compares the remote collection timestamp with the local Clock Marker:
//!
//! | remote vs local | action |
//! |---|---|
//! | equal | nothing |
//! | older | push local |
//! | newer | atomic full replace of local, marker set to remote time |
//! | absent (404) | push local |

use std::cmp::Ordering;
use tracing::{info, warn, debug};

use crate::error::SyncError;
use crate::metrics::{self, LatencyTimer};
use crate::notify::SyncNotice;
use crate::remote::RemoteError;

use super::{FollowSync, ReconcileOutcome};

impl FollowSync {
    /// Bring local and remote into agreement.
    ///
    /// On failure the local store is unchanged. A remote that has never been
    /// written is not a failure: the local collection is uploaded instead.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconcileOutcome, SyncError> {
        let _timer = LatencyTimer::new("reconcile");
        self.notifier.emit(SyncNotice::SyncStarted);

        let result = self.reconcile_inner().await;
        match &result {
            Ok(outcome) => {
                metrics::record_reconcile(outcome.as_str());
                info!(outcome = outcome.as_str(), "Reconciliation complete");
            }
            Err(e) => {
                metrics::record_reconcile("failed");
                warn!(error = %e, "Reconciliation failed, local and remote may diverge");
            }
        }
        result
    }

    async fn reconcile_inner(&self) -> Result<ReconcileOutcome, SyncError> {
        let token = self.credential().await?;

        let payload = match self.remote.fetch(&token).await {
            Ok(bytes) => bytes,
            Err(RemoteError::NotFound) => {
                info!("No remote follow list yet, uploading local copy");
                let report = self.push().await?;
                return Ok(ReconcileOutcome::Bootstrapped { records: report.records });
            }
            Err(e) => return Err(e.into()),
        };

        let remote = self.codec.decode(&payload)?;
        let local_time = self.store.clock_marker().await?.unwrap_or(0);
        debug!(remote_time = remote.time, local_time, remote_records = remote.len(), "Comparing timestamps");

        match remote.time.cmp(&local_time) {
            Ordering::Equal => Ok(ReconcileOutcome::InSync),
            Ordering::Less => {
                let report = self.push().await?;
                Ok(ReconcileOutcome::Pushed { records: report.records })
            }
            Ordering::Greater => {
                // Records and marker land in one transaction
                self.store.replace_all(&remote.users, remote.time).await?;
                let records = remote.len();
                metrics::set_record_count(records as u64);
                info!(records, remote_time = remote.time, "Local follow list replaced from remote");
                Ok(ReconcileOutcome::Replaced {
                    records,
                    remote_time: remote.time,
                })
            }
        }
    }
}
