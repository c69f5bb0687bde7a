// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for follow-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding application is responsible for choosing the exporter.
//!
//! # Metric Naming Convention
//! - `follow_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//! - `_bytes` suffix for size histograms

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record a reconciliation outcome (in_sync, pushed, replaced, bootstrapped, failed)
pub fn record_reconcile(outcome: &str) {
    counter!(
        "follow_sync_reconcile_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a push attempt (success, error)
pub fn record_push(status: &str) {
    counter!(
        "follow_sync_push_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a push dropped before upload
pub fn record_push_skipped(reason: &str) {
    counter!(
        "follow_sync_push_skipped_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record encoded payload size
pub fn record_push_bytes(bytes: usize) {
    histogram!("follow_sync_push_bytes").record(bytes as f64);
}

/// Record mutations coalesced into one push
pub fn record_push_coalesced(calls: usize) {
    histogram!("follow_sync_push_coalesced").record(calls as f64);
}

/// Record a retried transport or connect attempt
pub fn record_retry(operation: &str) {
    counter!(
        "follow_sync_retries_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record a local mutation (add, delete, clear)
pub fn record_mutation(op: &str) {
    counter!(
        "follow_sync_mutations_total",
        "op" => op.to_string()
    )
    .increment(1);
}

/// Set current local record count
pub fn set_record_count(count: u64) {
    gauge!("follow_sync_records").set(count as f64);
}

/// Record operation latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "follow_sync_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
