//! Metrics collection and exposition.
//!
//! # Metrics
//! - `portcullis_knocks_total` (counter): knocks by outcome (advance, reset)
//! - `portcullis_grants_total` (counter): completed knock sequences
//! - `portcullis_service_decisions_total` (counter): admissions by decision
//!   (allow, deny)
//! - `portcullis_tracked_clients` (gauge): size of the client state table
//!
//! # Design Decisions
//! - Recorder macros are no-ops until the exporter is installed, so
//!   subsystems record unconditionally and tests never install one
//! - The tracked-clients gauge is the one window into unbounded table growth

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter, serving scrapes over HTTP on `addr`.
///
/// Must run inside the tokio runtime. An install failure is logged and the
/// process carries on without exposition.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            describe_counter!(
                "portcullis_knocks_total",
                "Knock connections observed, by outcome"
            );
            describe_counter!("portcullis_grants_total", "Knock sequences completed");
            describe_counter!(
                "portcullis_service_decisions_total",
                "Protected-service admissions, by decision"
            );
            describe_gauge!(
                "portcullis_tracked_clients",
                "Client addresses currently tracked"
            );
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

/// Count one knock; `outcome` is `"advance"` or `"reset"`.
pub fn record_knock(outcome: &'static str) {
    counter!("portcullis_knocks_total", "outcome" => outcome).increment(1);
}

/// Count one issued grant.
pub fn record_grant() {
    counter!("portcullis_grants_total").increment(1);
}

/// Count one admission decision at the protected service.
pub fn record_service_decision(allowed: bool) {
    let decision = if allowed { "allow" } else { "deny" };
    counter!("portcullis_service_decisions_total", "decision" => decision).increment(1);
}

/// Track the current size of the client state table.
pub fn record_tracked_clients(count: usize) {
    gauge!("portcullis_tracked_clients").set(count as f64);
}
