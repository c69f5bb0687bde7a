// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Debounced push scheduling.
//!
//! The [`PushDebouncer`] coalesces a burst of mutations into one push. Each
//! [`schedule`](PushDebouncer::schedule) restarts the quiet period; the burst
//! is also due once the ceiling has elapsed since its first call, so a
//! steady stream of mutations still flushes at least once per ceiling.
//!
//! The debouncer never reads the clock itself. Callers pass the current
//! [`Instant`], which keeps it testable without waiting.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use follow_sync::{DebounceConfig, PushDebouncer, FlushReason};
//!
//! let mut debouncer = PushDebouncer::new(DebounceConfig {
//!     quiet: Duration::from_millis(2_000),
//!     max_wait: Duration::from_millis(10_000),
//! });
//!
//! let t0 = Instant::now();
//! debouncer.schedule(t0);
//! debouncer.schedule(t0 + Duration::from_millis(500));
//!
//! assert!(debouncer.take_if_due(t0 + Duration::from_millis(2_000)).is_none());
//! let push = debouncer.take_if_due(t0 + Duration::from_millis(2_500)).unwrap();
//! assert_eq!(push.reason, FlushReason::Quiet);
//! assert_eq!(push.calls, 2);
//! ```

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Why a pending push fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// Quiet period elapsed with no new scheduling call
    Quiet,
    /// Ceiling since the first call of the burst reached
    Ceiling,
    /// Caller asked to fire now
    Manual,
    /// Shutdown flush
    Shutdown,
}

impl std::fmt::Display for FlushReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quiet => write!(f, "quiet"),
            Self::Ceiling => write!(f, "ceiling"),
            Self::Manual => write!(f, "manual"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// Quiet period restarted by every scheduling call
    pub quiet: Duration,
    /// Forced-flush ceiling measured from the first call of a burst
    pub max_wait: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet: Duration::from_millis(2_000),
            max_wait: Duration::from_millis(10_000),
        }
    }
}

#[derive(Debug)]
struct Burst {
    first_at: Instant,
    last_at: Instant,
    calls: usize,
    skip: bool,
}

/// A burst that is ready to be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPush {
    pub reason: FlushReason,
    /// Scheduling calls coalesced into this push
    pub calls: usize,
    /// Time from the first call to the flush
    pub age: Duration,
    /// The burst was marked to be dropped instead of pushed
    pub skip: bool,
}

pub struct PushDebouncer {
    config: DebounceConfig,
    burst: Option<Burst>,
}

impl PushDebouncer {
    pub fn new(config: DebounceConfig) -> Self {
        Self { config, burst: None }
    }

    /// Record a scheduling call at `now`. Returns `true` if this call opened a new burst.
    pub fn schedule(&mut self, now: Instant) -> bool {
        match self.burst.as_mut() {
            Some(burst) => {
                burst.last_at = now;
                burst.calls += 1;
                false
            }
            None => {
                self.burst = Some(Burst {
                    first_at: now,
                    last_at: now,
                    calls: 1,
                    skip: false,
                });
                true
            }
        }
    }

    /// Mark the open burst so it is dropped rather than pushed.
    pub fn mark_skip(&mut self) {
        if let Some(burst) = self.burst.as_mut() {
            burst.skip = true;
        }
    }

    /// When the open burst becomes due, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.burst.as_ref().map(|b| self.quiet_deadline(b).min(self.ceiling_deadline(b)))
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.burst.is_some()
    }

    /// Take the burst if its deadline has passed at `now`.
    pub fn take_if_due(&mut self, now: Instant) -> Option<PendingPush> {
        let burst = self.burst.as_ref()?;
        let quiet = self.quiet_deadline(burst);
        let ceiling = self.ceiling_deadline(burst);
        if now < quiet.min(ceiling) {
            return None;
        }
        let reason = if ceiling < quiet { FlushReason::Ceiling } else { FlushReason::Quiet };
        self.take(now, reason)
    }

    /// Take the burst regardless of deadlines.
    pub fn force_flush(&mut self, now: Instant) -> Option<PendingPush> {
        self.take(now, FlushReason::Manual)
    }

    pub fn force_flush_with_reason(&mut self, now: Instant, reason: FlushReason) -> Option<PendingPush> {
        self.take(now, reason)
    }

    /// Drop any open burst without flushing it.
    pub fn cancel(&mut self) -> bool {
        self.burst.take().is_some()
    }

    fn take(&mut self, now: Instant, reason: FlushReason) -> Option<PendingPush> {
        let burst = self.burst.take()?;
        let push = PendingPush {
            reason,
            calls: burst.calls,
            age: now.saturating_duration_since(burst.first_at),
            skip: burst.skip,
        };
        debug!(calls = push.calls, age_ms = push.age.as_millis() as u64, reason = %reason, "Push burst taken");
        Some(push)
    }

    fn quiet_deadline(&self, burst: &Burst) -> Instant {
        burst.last_at + self.config.quiet
    }

    fn ceiling_deadline(&self, burst: &Burst) -> Instant {
        burst.first_at + self.config.max_wait
    }
}
