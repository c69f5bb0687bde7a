// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Fire-and-forget status notices for the UI.
//!
//! Notices go out on a broadcast channel. Sending never blocks and never
//! fails from the engine's point of view: with no subscribers, or with a
//! lagging one, notices are simply dropped.

use tokio::sync::broadcast;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// Reconciliation with the remote started
    SyncStarted,
    /// A debounced push is uploading the collection
    UploadStarted,
    /// The remote could not be reached; local changes stay unsynced
    SyncFailed { reason: String },
    /// The local collection was emptied
    Cleared,
}

impl std::fmt::Display for SyncNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SyncStarted => write!(f, "Syncing follow list..."),
            Self::UploadStarted => write!(f, "Uploading follow list..."),
            Self::SyncFailed { .. } => write!(f, "Follow list sync failed, check your network"),
            Self::Cleared => write!(f, "Follow list cleared."),
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<SyncNotice>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.tx.subscribe()
    }

    pub fn emit(&self, notice: SyncNotice) {
        if self.tx.send(notice).is_err() {
            trace!("Notice dropped, no subscribers");
        }
    }
}
