//! Metric instrument factories for bullmq-explorer.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op, so recording is
//! always safe.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("bullmq-explorer")
}

/// Counter: engine operations issued against the store.
/// Labels: `queue`, `operation` ("count" | "page" | "load" | "list" | ...).
pub fn store_operations() -> Counter<u64> {
    meter()
        .u64_counter("explorer.store.operations")
        .with_description("Number of engine operations issued against the store")
        .build()
}

/// Histogram: engine operation duration in milliseconds.
/// Labels: `operation`.
pub fn query_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("explorer.query.duration_ms")
        .with_description("Engine operation duration in milliseconds")
        .with_unit("ms")
        .build()
}

/// Counter: delete attempts.
/// Labels: `queue`, `result` ("deleted" | "not_found").
pub fn jobs_deleted() -> Counter<u64> {
    meter()
        .u64_counter("explorer.jobs.deleted")
        .with_description("Number of job delete attempts")
        .build()
}

/// Counter: job identifiers examined by search scans.
/// Labels: `queue`.
pub fn search_scanned() -> Counter<u64> {
    meter()
        .u64_counter("explorer.search.scanned")
        .with_description("Job identifiers examined while searching")
        .build()
}
