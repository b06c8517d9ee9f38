//! Span helpers for engine operations.

use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use std::time::Instant;
use tracing::Span;

/// Start a span for one engine operation on a queue.
///
/// `query.scanned` and `query.matched` are declared empty and filled in by
/// [`record_scan`] when a search runs.
pub fn start_query_span(operation: &'static str, queue: &str) -> Span {
    tracing::info_span!(
        "explorer.query",
        "query.operation" = operation,
        "query.queue" = queue,
        "query.scanned" = tracing::field::Empty,
        "query.matched" = tracing::field::Empty,
    )
}

/// Record search scan totals on a query span.
pub fn record_scan(span: &Span, scanned: u64, matched: u64) {
    span.record("query.scanned", scanned);
    span.record("query.matched", matched);
}

/// Count one operation and its duration since `started`.
pub fn record_operation(operation: &'static str, queue: &str, started: Instant) {
    metrics::store_operations().add(
        1,
        &[
            KeyValue::new("queue", queue.to_string()),
            KeyValue::new("operation", operation),
        ],
    );
    metrics::query_duration_ms().record(
        started.elapsed().as_secs_f64() * 1000.0,
        &[KeyValue::new("operation", operation)],
    );
}
