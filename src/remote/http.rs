// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! HTTP transport for the collection resource.
//!
//! `GET <url>` returns the binary payload, `PUT <url>` replaces it. Transient
//! transport failures may be retried here per [`RetryConfig`]; `NotFound`
//! and auth rejections never are.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::debug;

use crate::config::FollowSyncConfig;
use crate::resilience::retry::{retry_if, RetryConfig};
use super::{RemoteClient, RemoteError};

pub struct HttpRemote {
    client: Client,
    url: String,
    retry: RetryConfig,
}

/// Map a response status onto the remote error taxonomy.
fn check_status(status: StatusCode) -> Result<(), RemoteError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::NOT_FOUND {
        Err(RemoteError::NotFound)
    } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        Err(RemoteError::Auth(format!("HTTP {}", status)))
    } else {
        Err(RemoteError::Transport(format!("HTTP {}", status)))
    }
}

fn is_transient(err: &RemoteError) -> bool {
    matches!(err, RemoteError::Transport(_))
}

impl HttpRemote {
    /// Single-attempt client for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            retry: RetryConfig::none(),
        }
    }

    /// Build from `config.remote_url`.
    pub fn from_config(config: &FollowSyncConfig) -> Result<Self, RemoteError> {
        let url = config
            .remote_url
            .clone()
            .ok_or_else(|| RemoteError::Transport("remote_url is not configured".to_string()))?;
        Ok(Self::new(url).with_retry(config.transport_retry()))
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteClient for HttpRemote {
    async fn fetch(&self, token: &str) -> Result<Vec<u8>, RemoteError> {
        retry_if("follow_fetch", &self.retry, || async {
            let response = self
                .client
                .get(&self.url)
                .bearer_auth(token)
                .send()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
            check_status(response.status())?;
            let bytes = response
                .bytes()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
            debug!(bytes = bytes.len(), "Fetched remote follow payload");
            Ok(bytes.to_vec())
        }, is_transient)
        .await
    }

    async fn store(&self, token: &str, payload: Vec<u8>) -> Result<(), RemoteError> {
        retry_if("follow_store", &self.retry, || async {
            let response = self
                .client
                .put(&self.url)
                .bearer_auth(token)
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(payload.clone())
                .send()
                .await
                .map_err(|e| RemoteError::Transport(e.to_string()))?;
            check_status(response.status())
        }, is_transient)
        .await
    }
}
