//! Integration tests for telemetry initialization and span helpers.

use bullmq_explorer::telemetry::query::{record_operation, record_scan, start_query_span};
use bullmq_explorer::telemetry::{TelemetryConfig, init_telemetry, metrics};
use opentelemetry::KeyValue;
use std::time::Instant;

#[test]
fn telemetry_initializes_without_endpoint() {
    // Note: tracing subscriber can only be set once per process.
    // This may return Err if a global subscriber was already set by
    // another test in this process; that is acceptable.
    let config = TelemetryConfig {
        endpoint: None,
        service_name: "bullmq-explorer-test".to_string(),
        default_level: "debug".to_string(),
    };
    if let Ok(guard) = init_telemetry(config) {
        guard.force_flush();
    }
}

#[test]
fn query_span_records_scan_totals() {
    let span = start_query_span("list", "emails");
    record_scan(&span, 250, 3);
    let _entered = span.enter();
}

#[test]
fn operations_record_against_noop_provider() {
    record_operation("count", "emails", Instant::now());
    metrics::jobs_deleted().add(1, &[KeyValue::new("result", "deleted")]);
    metrics::search_scanned().add(10, &[KeyValue::new("queue", "emails")]);
}
