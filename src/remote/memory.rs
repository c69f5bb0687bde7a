// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process remote and static credentials.
//!
//! [`InMemoryRemote`] behaves like the HTTP resource (absent until the
//! first store, whole-payload replace on every store) and records traffic
//! so callers can assert on it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{Authenticator, RemoteClient, RemoteError};

#[derive(Default)]
pub struct InMemoryRemote {
    payload: Mutex<Option<Vec<u8>>>,
    failure: Mutex<Option<RemoteError>>,
    store_delay: Mutex<Option<Duration>>,
    last_token: Mutex<Option<String>>,
    fetches: AtomicUsize,
    stores: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote that already holds `payload`.
    #[must_use]
    pub fn with_payload(payload: Vec<u8>) -> Self {
        let remote = Self::default();
        *remote.payload.lock() = Some(payload);
        remote
    }

    /// Current stored payload, if any
    #[must_use]
    pub fn payload(&self) -> Option<Vec<u8>> {
        self.payload.lock().clone()
    }

    /// Overwrite the stored payload as another device would.
    pub fn set_payload(&self, payload: Option<Vec<u8>>) {
        *self.payload.lock() = payload;
    }

    /// Make every fetch and store fail with `failure` until cleared.
    pub fn set_failure(&self, failure: Option<RemoteError>) {
        *self.failure.lock() = failure;
    }

    /// Hold each store for `delay` before it lands.
    pub fn set_store_delay(&self, delay: Option<Duration>) {
        *self.store_delay.lock() = delay;
    }

    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of completed stores
    #[must_use]
    pub fn stores(&self) -> usize {
        self.stores.load(Ordering::SeqCst)
    }

    /// Most stores ever observed running at once
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn last_token(&self) -> Option<String> {
        self.last_token.lock().clone()
    }

    fn check_failure(&self) -> Result<(), RemoteError> {
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteClient for InMemoryRemote {
    async fn fetch(&self, token: &str) -> Result<Vec<u8>, RemoteError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_token.lock() = Some(token.to_string());
        self.check_failure()?;
        self.payload.lock().clone().ok_or(RemoteError::NotFound)
    }

    async fn store(&self, token: &str, payload: Vec<u8>) -> Result<(), RemoteError> {
        *self.last_token.lock() = Some(token.to_string());
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.store_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.check_failure();
        if result.is_ok() {
            *self.payload.lock() = Some(payload);
            self.stores.fetch_add(1, Ordering::SeqCst);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Fixed bearer token, or none at all to simulate a signed-out user.
#[derive(Default)]
pub struct StaticToken {
    token: Option<String>,
    refreshes: AtomicUsize,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// No credential available.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Authenticator for StaticToken {
    async fn ensure_fresh(&self) -> Result<(), RemoteError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.token.is_none() {
            return Err(RemoteError::Auth("not signed in".to_string()));
        }
        Ok(())
    }

    fn current_token(&self) -> Option<String> {
        self.token.clone()
    }
}
