// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for model-sync.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `model_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `model`: model type name
//! - `operation`: detail, list
//! - `status`: success, not_found, unauthorized, error
//! - `outcome`: hit, stale, miss

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

use crate::remote::NetworkError;

/// Status label for a remote fetch result
#[must_use]
pub fn fetch_status<T>(result: &Result<T, NetworkError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(NetworkError::NotFound) => "not_found",
        Err(NetworkError::Unauthorized) => "unauthorized",
        Err(_) => "error",
    }
}

/// Record a remote fetch outcome
pub fn record_fetch(model: &str, operation: &str, status: &str) {
    counter!(
        "model_sync_remote_fetches_total",
        "model" => model.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record remote fetch latency
pub fn record_fetch_latency(model: &str, operation: &str, duration: Duration) {
    histogram!(
        "model_sync_remote_fetch_seconds",
        "model" => model.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a one-shot cache lookup (hit, stale, miss)
pub fn record_cache_lookup(model: &str, outcome: &str) {
    counter!(
        "model_sync_cache_lookups_total",
        "model" => model.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a list reconciliation
pub fn record_reconcile(model: &str, upserted: usize, deleted: usize) {
    counter!(
        "model_sync_reconcile_upserts_total",
        "model" => model.to_string()
    )
    .increment(upserted as u64);
    counter!(
        "model_sync_reconcile_deletes_total",
        "model" => model.to_string()
    )
    .increment(deleted as u64);
}

/// Record a swallowed housekeeping failure (reconcile delete, not-found purge)
pub fn record_housekeeping_error(model: &str, operation: &str) {
    counter!(
        "model_sync_housekeeping_errors_total",
        "model" => model.to_string(),
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Set number of live pipelines
pub fn set_active_streams(count: usize) {
    gauge!("model_sync_active_streams").set(count as f64);
}

/// Record a stream subscription (`shared` when it joined an existing pipeline)
pub fn record_subscribe(model: &str, shared: bool) {
    counter!(
        "model_sync_stream_subscribes_total",
        "model" => model.to_string(),
        "shared" => if shared { "true" } else { "false" }
    )
    .increment(1);
}

/// Record a pipeline teardown
pub fn record_teardown(model: &str) {
    counter!(
        "model_sync_stream_teardowns_total",
        "model" => model.to_string()
    )
    .increment(1);
}

/// Record a payload that did not match its stream's expected type
pub fn record_type_mismatch() {
    counter!("model_sync_type_mismatches_total").increment(1);
}

/// Record a value published to a stream
pub fn record_publish(model: &str) {
    counter!(
        "model_sync_stream_publishes_total",
        "model" => model.to_string()
    )
    .increment(1);
}

/// A timing guard that records remote fetch latency on drop
pub struct LatencyTimer {
    model: &'static str,
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(model: &'static str, operation: &'static str) -> Self {
        Self {
            model,
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_fetch_latency(self.model, self.operation, self.start.elapsed());
    }
}
