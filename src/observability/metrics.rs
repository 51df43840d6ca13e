//! Metrics collection and exposition.
//!
//! # Metrics
//! - `scheme_requests_total` (counter): requests by scheme kind and outcome
//! - `scheme_request_duration_seconds` (histogram): begin-to-outcome latency by kind
//! - `scheme_inflight_requests` (gauge): requests with work scheduled
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter serves its own scrape endpoint

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::scheme::SchemeKind;

pub const REQUESTS_TOTAL: &str = "scheme_requests_total";
pub const REQUEST_DURATION: &str = "scheme_request_duration_seconds";
pub const INFLIGHT_REQUESTS: &str = "scheme_inflight_requests";

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Canceled,
    Failed,
    NotHandled,
    Rejected,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Completed => "completed",
            Outcome::Canceled => "canceled",
            Outcome::Failed => "failed",
            Outcome::NotHandled => "not_handled",
            Outcome::Rejected => "rejected",
        }
    }
}

pub fn record_request(kind: Option<SchemeKind>, outcome: Outcome, elapsed: Duration) {
    let kind = kind.map(|k| k.as_str()).unwrap_or("none");
    metrics::counter!(REQUESTS_TOTAL, "kind" => kind, "outcome" => outcome.as_str()).increment(1);
    metrics::histogram!(REQUEST_DURATION, "kind" => kind).record(elapsed.as_secs_f64());
}

pub fn inflight_changed(delta: f64) {
    metrics::gauge!(INFLIGHT_REQUESTS).increment(delta);
}

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
