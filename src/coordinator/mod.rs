// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Follow list sync coordinator.
//!
//! The [`FollowSync`] owns one user's follow collection for one session:
//! - Mutation API writing through to the [`LocalStore`]
//! - Clock Marker bookkeeping (bumped before every local write)
//! - Reconciliation: push, full replace, or no-op by last-writer-wins
//! - Debounced push loop coalescing bursts of mutations
//!
//! # Lifecycle
//!
//! ```text
//! Created → Running → ShuttingDown → Stopped
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use follow_sync::{FollowSync, FollowSyncConfig, FollowSource, InMemoryStore, InMemoryRemote, StaticToken};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), follow_sync::SyncError> {
//! let engine = Arc::new(FollowSync::new(
//!     FollowSyncConfig::default(),
//!     Arc::new(InMemoryStore::new()),
//!     Arc::new(InMemoryRemote::new()),
//!     Arc::new(StaticToken::new("token")),
//! )?);
//! let push_loop = engine.spawn();
//!
//! engine.add_or_update(&FollowSource::new("u1", "Ada", "")).await?;
//! assert!(engine.exists("u1").await?);
//!
//! engine.shutdown(true).await?;
//! push_loop.await.ok();
//! # Ok(())
//! # }
//! ```

mod types;
mod api;
mod reconcile;
mod flush;
mod lifecycle;

pub use types::{SessionState, ReconcileOutcome, PushReport};

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use parking_lot::Mutex;
use tokio::sync::{watch, broadcast, Notify, OnceCell};

use crate::batching::debounce::{DebounceConfig, PushDebouncer};
use crate::clock::{Clock, SystemClock};
use crate::codec::{FollowCodec, PostcardCodec};
use crate::config::FollowSyncConfig;
use crate::error::SyncError;
use crate::notify::{Notifier, SyncNotice};
use crate::remote::{Authenticator, RemoteClient};
use crate::storage::traits::LocalStore;

/// Session-scoped follow list orchestrator.
///
/// Calls are expected to come sequentially from the owning session; the
/// push loop runs alongside them and is the only thing that fires
/// debounced pushes.
pub struct FollowSync {
    pub(super) config: FollowSyncConfig,

    pub(super) store: Arc<dyn LocalStore>,
    pub(super) remote: Arc<dyn RemoteClient>,
    pub(super) auth: Arc<dyn Authenticator>,
    pub(super) codec: Arc<dyn FollowCodec>,
    pub(super) clock: Arc<dyn Clock>,

    /// UI side channel
    pub(super) notifier: Notifier,

    /// Session state (broadcast to watchers)
    pub(super) state: watch::Sender<SessionState>,
    pub(super) state_rx: watch::Receiver<SessionState>,

    /// Pending push burst
    pub(super) debouncer: Mutex<PushDebouncer>,

    /// Wakes the push loop when the deadline may have moved
    pub(super) wake: Notify,

    /// Serializes uploads so at most one is in flight
    pub(super) push_lock: tokio::sync::Mutex<()>,

    /// Set once the session has scheduled its first push
    pub(super) scheduled_once: AtomicBool,

    /// Whether the store was empty when the session's first mutation arrived
    pub(super) opened_empty: OnceCell<bool>,
}

impl FollowSync {
    /// Create an engine with the postcard codec and the system clock.
    pub fn new(
        config: FollowSyncConfig,
        store: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteClient>,
        auth: Arc<dyn Authenticator>,
    ) -> Result<Self, SyncError> {
        config.validate().map_err(SyncError::Config)?;

        let (state_tx, state_rx) = watch::channel(SessionState::Created);
        let debounce = DebounceConfig {
            quiet: config.push_quiet(),
            max_wait: config.push_max_wait(),
        };

        Ok(Self {
            notifier: Notifier::new(config.notice_capacity),
            config,
            store,
            remote,
            auth,
            codec: Arc::new(PostcardCodec),
            clock: Arc::new(SystemClock),
            state: state_tx,
            state_rx,
            debouncer: Mutex::new(PushDebouncer::new(debounce)),
            wake: Notify::new(),
            push_lock: tokio::sync::Mutex::new(()),
            scheduled_once: AtomicBool::new(false),
            opened_empty: OnceCell::new(),
        })
    }

    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn FollowCodec>) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn config(&self) -> &FollowSyncConfig {
        &self.config
    }

    /// Get current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Subscribe to UI notices.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
        self.notifier.subscribe()
    }

    /// Whether a debounced push is waiting to fire.
    #[must_use]
    pub fn has_pending_push(&self) -> bool {
        self.debouncer.lock().is_pending()
    }

    pub(super) fn ensure_accepting(&self) -> Result<(), SyncError> {
        match self.state() {
            SessionState::ShuttingDown | SessionState::Stopped => Err(SyncError::ShuttingDown),
            _ => Ok(()),
        }
    }

    /// Record, once per session and before any write, whether the store
    /// started out empty. A failed count leaves it unrecorded.
    pub(super) async fn note_session_start(&self) -> Result<(), SyncError> {
        self.opened_empty
            .get_or_try_init(|| async { Ok::<_, SyncError>(self.store.count().await? == 0) })
            .await?;
        Ok(())
    }

    /// Refresh and fetch the bearer credential.
    pub(super) async fn credential(&self) -> Result<String, SyncError> {
        self.auth.ensure_fresh().await?;
        self.auth
            .current_token()
            .ok_or_else(|| SyncError::Auth("no credential available".to_string()))
    }
}
