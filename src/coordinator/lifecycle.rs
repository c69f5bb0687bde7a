//! Session lifecycle: push loop and shutdown.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, debug};

use crate::batching::debounce::FlushReason;
use crate::error::SyncError;

use super::{FollowSync, PushReport, SessionState};

impl FollowSync {
    /// Drive debounced pushes until [`shutdown`](Self::shutdown).
    ///
    /// Pushes run inline, so at most one is in flight; mutations arriving
    /// during a push open the next burst rather than a concurrent upload.
    pub async fn run(&self) {
        let started = self.state.send_if_modified(|state| {
            if *state == SessionState::Created {
                *state = SessionState::Running;
                true
            } else {
                false
            }
        });
        if !started {
            debug!(state = %self.state(), "Push loop not started");
            return;
        }
        info!("Follow push loop running");

        let mut state_rx = self.state_rx.clone();
        loop {
            if *state_rx.borrow_and_update() != SessionState::Running {
                break;
            }

            let deadline = self.debouncer.lock().deadline();
            match deadline {
                Some(at) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(at) => self.fire_due_push().await,
                        _ = self.wake.notified() => {}
                        _ = state_rx.changed() => {}
                    }
                }
                None => {
                    tokio::select! {
                        _ = self.wake.notified() => {}
                        _ = state_rx.changed() => {}
                    }
                }
            }
        }

        info!("Follow push loop stopped");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run().await })
    }

    /// Stop accepting mutations and end the push loop.
    ///
    /// With `flush`, a pending burst is pushed first; otherwise it is
    /// dropped. Either way the session ends `Stopped`.
    pub async fn shutdown(&self, flush: bool) -> Result<Option<PushReport>, SyncError> {
        let _ = self.state.send(SessionState::ShuttingDown);
        info!(flush, "Follow sync shutting down");

        let result = if flush {
            self.flush_with_reason(FlushReason::Shutdown).await
        } else {
            if self.debouncer.lock().cancel() {
                info!("Pending push dropped at shutdown");
            }
            Ok(None)
        };

        let _ = self.state.send(SessionState::Stopped);
        result
    }
}
