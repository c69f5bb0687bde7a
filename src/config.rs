// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the follow sync engine.
//!
//! # Example
//!
//! ```
//! use follow_sync::FollowSyncConfig;
//!
//! // Minimal config (uses defaults)
//! let config = FollowSyncConfig::default();
//! assert_eq!(config.page_limit, 50);
//! assert_eq!(config.push_quiet_ms, 2_000);
//! assert_eq!(config.push_max_wait_ms, 10_000);
//!
//! // Near-immediate flush instead of true debounce
//! let config = FollowSyncConfig {
//!     remote_url: Some("https://api.example/user/follow".into()),
//!     push_quiet_ms: 2_000,
//!     push_max_wait_ms: 10,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::resilience::retry::RetryConfig;

/// Configuration for the follow sync engine.
///
/// Debounce: every mutation restarts a `push_quiet_ms` quiet period, and a
/// burst is force-flushed `push_max_wait_ms` after its first mutation. The
/// defaults give a true debounce (ceiling larger than quiet period).
#[derive(Debug, Clone, Deserialize)]
pub struct FollowSyncConfig {
    /// Collection resource URL (e.g., "https://api.example/user/follow")
    #[serde(default)]
    pub remote_url: Option<String>,

    /// SQLite URL for the local cache (e.g., "sqlite://follow.db")
    #[serde(default)]
    pub sqlite_url: Option<String>,

    /// Records per page
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Quiet period before a scheduled push fires
    #[serde(default = "default_push_quiet_ms")]
    pub push_quiet_ms: u64,

    /// Upper bound on delay since the first mutation of a burst
    #[serde(default = "default_push_max_wait_ms")]
    pub push_max_wait_ms: u64,

    /// Drop a session's first push if the store was empty when the session
    /// started and still is when the push fires
    #[serde(default = "default_skip_fresh_empty_push")]
    pub skip_fresh_empty_push: bool,

    /// Buffered notices per subscriber
    #[serde(default = "default_notice_capacity")]
    pub notice_capacity: usize,

    /// Attempts per HTTP request (1 = no transport retry)
    #[serde(default = "default_transport_attempts")]
    pub transport_attempts: usize,
}

fn default_page_limit() -> usize { 50 }
fn default_push_quiet_ms() -> u64 { 2_000 }
fn default_push_max_wait_ms() -> u64 { 10_000 }
fn default_skip_fresh_empty_push() -> bool { true }
fn default_notice_capacity() -> usize { 64 }
fn default_transport_attempts() -> usize { 1 }

impl Default for FollowSyncConfig {
    fn default() -> Self {
        Self {
            remote_url: None,
            sqlite_url: None,
            page_limit: default_page_limit(),
            push_quiet_ms: default_push_quiet_ms(),
            push_max_wait_ms: default_push_max_wait_ms(),
            skip_fresh_empty_push: default_skip_fresh_empty_push(),
            notice_capacity: default_notice_capacity(),
            transport_attempts: default_transport_attempts(),
        }
    }
}

impl FollowSyncConfig {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_limit == 0 {
            return Err("page_limit must be greater than zero".to_string());
        }
        if self.push_max_wait_ms == 0 {
            return Err("push_max_wait_ms must be greater than zero".to_string());
        }
        if self.notice_capacity == 0 {
            return Err("notice_capacity must be greater than zero".to_string());
        }
        if self.transport_attempts == 0 {
            return Err("transport_attempts must be at least 1".to_string());
        }
        if self.push_max_wait_ms < self.push_quiet_ms {
            warn!(
                quiet_ms = self.push_quiet_ms,
                max_wait_ms = self.push_max_wait_ms,
                "Push ceiling is below the quiet period; pushes flush on the ceiling"
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn push_quiet(&self) -> Duration {
        Duration::from_millis(self.push_quiet_ms)
    }

    #[must_use]
    pub fn push_max_wait(&self) -> Duration {
        Duration::from_millis(self.push_max_wait_ms)
    }

    /// Retry policy handed to the HTTP transport.
    #[must_use]
    pub fn transport_retry(&self) -> RetryConfig {
        if self.transport_attempts <= 1 {
            RetryConfig::none()
        } else {
            RetryConfig {
                max_retries: Some(self.transport_attempts),
                ..RetryConfig::transport()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_true_debounce() {
        let config = FollowSyncConfig::default();
        assert!(config.push_max_wait() > config.push_quiet());
        assert!(config.skip_fresh_empty_push);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_uses_defaults() {
        let config: FollowSyncConfig = serde_json::from_str(
            r#"{"remote_url": "https://api.example/follow", "push_max_wait_ms": 10}"#,
        )
        .unwrap();

        assert_eq!(config.remote_url.as_deref(), Some("https://api.example/follow"));
        assert_eq!(config.push_max_wait_ms, 10);
        assert_eq!(config.push_quiet_ms, 2_000);
        assert_eq!(config.page_limit, 50);
    }

    #[test]
    fn test_validate_rejects_zero_ceiling() {
        let config = FollowSyncConfig {
            push_max_wait_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_page_limit() {
        let config = FollowSyncConfig {
            page_limit: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_transport_retry_follows_attempts() {
        let config = FollowSyncConfig::default();
        assert_eq!(config.transport_retry().max_retries, Some(1));

        let config = FollowSyncConfig {
            transport_attempts: 4,
            ..Default::default()
        };
        assert_eq!(config.transport_retry().max_retries, Some(4));
    }
}
