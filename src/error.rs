// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use thiserror::Error;

use crate::codec::CodecError;
use crate::remote::RemoteError;
use crate::storage::traits::StorageError;

/// Errors surfaced by the follow sync engine.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Local store failure; fatal to the triggering call
    #[error("Local store error: {0}")]
    Storage(#[from] StorageError),
    /// Remote payload could not be decoded (or local state encoded)
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    /// The blocking first-use reconciliation failed, so the mutation was not applied
    #[error("Initial sync failed, mutation aborted: {0}")]
    InitialSync(Box<SyncError>),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Engine is shutting down")]
    ShuttingDown,
}

impl From<RemoteError> for SyncError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Auth(msg) => Self::Auth(msg),
            RemoteError::Transport(msg) => Self::Transport(msg),
            // Only reachable outside the pull path, where absence is unexpected
            RemoteError::NotFound => Self::Transport("remote collection not found".to_string()),
        }
    }
}

impl SyncError {
    /// Network or credential failure (local state untouched, retry later).
    #[must_use]
    pub fn is_remote(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Auth(_) => true,
            Self::InitialSync(inner) => inner.is_remote(),
            _ => false,
        }
    }
}
