//! Metrics recording.
//!
//! # Metrics
//! - `registry_head_requests_skipped_total` (counter): HEAD requests answered locally
//! - `registry_requests_forwarded_total` (counter): requests passed to the wrapped transport, by method
//! - `registry_blob_checks_total` (counter): blob existence checks, by outcome

use axum::http::Method;

pub fn record_head_skipped() {
    metrics::counter!("registry_head_requests_skipped_total").increment(1);
}

pub fn record_forwarded(method: &Method) {
    metrics::counter!("registry_requests_forwarded_total", "method" => method.to_string())
        .increment(1);
}

pub fn record_blob_check(outcome: &'static str) {
    metrics::counter!("registry_blob_checks_total", "outcome" => outcome).increment(1);
}
