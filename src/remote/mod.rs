// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote collection access and credentials.
//!
//! The remote holds one opaque binary payload per user. Both reads and
//! writes carry a bearer credential obtained from an [`Authenticator`].
//! "Resource absent" is a distinct [`RemoteError::NotFound`] variant so the
//! reconciler can treat it as a first sync instead of a failure.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The collection has never been uploaded
    #[error("Remote collection not found")]
    NotFound,
    /// Network failure or unexpected HTTP status
    #[error("Transport error: {0}")]
    Transport(String),
    /// Credential could not be obtained or was rejected
    #[error("Authentication error: {0}")]
    Auth(String),
}

/// Authenticated GET/PUT of the collection payload.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn fetch(&self, token: &str) -> Result<Vec<u8>, RemoteError>;
    async fn store(&self, token: &str, payload: Vec<u8>) -> Result<(), RemoteError>;
}

/// Bearer credential source.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Refresh the credential if it has expired.
    async fn ensure_fresh(&self) -> Result<(), RemoteError>;

    fn current_token(&self) -> Option<String>;
}
