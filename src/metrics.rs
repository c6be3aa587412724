// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the query builder.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application installs the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `manticore_builder_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `path`: raw, sql, structured
//! - `operation`: get, count, paginate, facets
//! - `status`: success, error

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// Record a dispatched search
pub fn record_search_query(path: &str, status: &str) {
    counter!(
        "manticore_builder_queries_total",
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record search round-trip latency
pub fn record_search_latency(path: &str, operation: &str, duration: Duration) {
    histogram!(
        "manticore_builder_query_seconds",
        "path" => path.to_string(),
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record hydrated record count
pub fn record_search_results(path: &str, count: usize) {
    histogram!(
        "manticore_builder_results",
        "path" => path.to_string()
    )
    .record(count as f64);
}

/// Record a facet request and how many aggregations it asked for
pub fn record_facet_request(aggregations: usize) {
    counter!("manticore_builder_facet_requests_total").increment(1);
    histogram!("manticore_builder_facet_aggregations").record(aggregations as f64);
}

/// Record eager relation loading
pub fn record_relation_load(relations: usize, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!(
        "manticore_builder_relation_loads_total",
        "status" => status
    )
    .increment(1);
    histogram!("manticore_builder_relations_per_load").record(relations as f64);
}

/// A timing guard that records latency on drop
pub struct LatencyTimer {
    path: &'static str,
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    pub fn new(path: &'static str, operation: &'static str) -> Self {
        Self {
            path,
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_search_latency(self.path, self.operation, self.start.elapsed());
    }
}
