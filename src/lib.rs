// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # Follow Sync
//!
//! A local-first follow list: a persistent local cache of followed entities
//! kept in agreement with one remote authoritative copy by whole-collection
//! last-writer-wins.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Mutation API                          │
//! │  • add_or_update / delete / clear                          │
//! │  • Clock Marker bumped before every local write            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Local Store (memory / SQLite)              │
//! │  • Keyed records, paged newest-first                       │
//! │  • Atomic full replace (records + marker)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               (debounced push / reconciliation)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Remote collection                       │
//! │  • One binary payload: timestamp + every record            │
//! │  • Bearer-authenticated GET / PUT                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reconciliation
//!
//! The remote payload's timestamp is compared with the local Clock Marker.
//! Newer remote → the local collection is replaced in one transaction.
//! Newer local → the local collection is uploaded. Equal → nothing. A
//! remote that does not exist yet is bootstrapped with a push.
//!
//! ## Modules
//!
//! - [`coordinator`]: The [`FollowSync`] orchestrator
//! - [`storage`]: Local store trait and backends (memory, SQLite)
//! - [`remote`]: Remote client and credentials (HTTP, in-memory)
//! - [`codec`]: Binary wire codec
//! - [`batching`]: Debounced push scheduling
//! - [`notify`]: UI notice side channel
//! - [`resilience`]: Transport-level retry

pub mod config;
pub mod error;
pub mod record;
pub mod codec;
pub mod clock;
pub mod storage;
pub mod remote;
pub mod batching;
pub mod resilience;
pub mod notify;
pub mod coordinator;
pub mod metrics;

pub use config::FollowSyncConfig;
pub use error::SyncError;
pub use record::{FollowRecord, FollowSource, FollowSnapshot, SourceImage};
pub use codec::{FollowCodec, PostcardCodec, CodecError};
pub use clock::{Clock, SystemClock, ManualClock};
pub use storage::traits::{LocalStore, SortOrder, StorageError};
pub use storage::memory::InMemoryStore;
pub use storage::sqlite::SqliteStore;
pub use remote::{RemoteClient, Authenticator, RemoteError};
pub use remote::http::HttpRemote;
pub use remote::memory::{InMemoryRemote, StaticToken};
pub use batching::debounce::{PushDebouncer, DebounceConfig, FlushReason, PendingPush};
pub use resilience::retry::RetryConfig;
pub use notify::{Notifier, SyncNotice};
pub use coordinator::{FollowSync, SessionState, ReconcileOutcome, PushReport};
pub use metrics::LatencyTimer;
