// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry logic with exponential backoff.
//!
//! Retry belongs to collaborators (store connection, HTTP transport), never
//! to the reconciliation core: a failed fetch or push surfaces immediately.
//!
//! # Example
//!
//! ```
//! use follow_sync::RetryConfig;
//!
//! // Startup: fail fast on bad config
//! let startup = RetryConfig::startup();
//! assert_eq!(startup.max_retries, Some(5));
//!
//! // Transport: quick retry, then fail
//! let transport = RetryConfig::transport();
//! assert_eq!(transport.max_retries, Some(3));
//!
//! // Single attempt
//! assert_eq!(RetryConfig::none().max_retries, Some(1));
//! ```

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use std::future::Future;

use crate::metrics;

/// Configuration for connection/operation retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Total attempts allowed (`None` retries forever)
    pub max_retries: Option<usize>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryConfig {
    /// Fast-fail retry for opening local storage.
    /// 5 attempts with exponential backoff, failing after ~5 seconds.
    #[must_use]
    pub fn startup() -> Self {
        Self {
            max_retries: Some(5),
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// Quick retry for individual HTTP requests.
    #[must_use]
    pub fn transport() -> Self {
        Self {
            max_retries: Some(3),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// One attempt, no retry.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: Some(1),
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            factor: 1.0,
        }
    }
}

/// Retry every failure until the attempt budget runs out.
pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_if(operation_name, config, operation, |_| true).await
}

/// Retry only failures for which `should_retry` returns `true`; others
/// are returned immediately.
pub async fn retry_if<F, Fut, T, E, P>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut delay = config.initial_delay;
    let mut attempt = 0usize;

    loop {
        attempt += 1;
        let err = match operation().await {
            Ok(val) => {
                if attempt > 1 {
                    info!(op = operation_name, attempt, "Recovered after retry");
                }
                return Ok(val);
            }
            Err(err) => err,
        };

        if !should_retry(&err) {
            debug!(op = operation_name, attempt, error = %err, "Permanent failure, not retrying");
            return Err(err);
        }
        if config.max_retries.is_some_and(|max| attempt >= max) {
            if attempt > 1 {
                warn!(op = operation_name, attempt, error = %err, "Retry budget exhausted");
            }
            return Err(err);
        }

        warn!(op = operation_name, attempt, error = %err, ?delay, "Attempt failed, retrying");
        metrics::record_retry(operation_name);
        sleep(delay).await;
        delay = delay.mul_f64(config.factor).min(config.max_delay);
    }
}
