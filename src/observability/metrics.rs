//! Metrics collection and exposition.
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by app, method, status
//! - `http_request_duration_seconds` (histogram): latency by app and route template
//! - `resilience_calls_total` (counter): guarded calls by policy, kind, outcome
//! - `resilience_fallbacks_total` (counter): fallbacks by caller and cause
//! - `circuit_breaker_transitions_total` (counter): state changes by breaker
//! - `service_instance_healthy` (gauge): 1=healthy, 0=unhealthy
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::CircuitState;
use crate::resilience::error::ErrorKind;
use crate::resilience::policy::PolicyKind;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(app: &'static str, method: &str, route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "http_requests_total",
        "app" => app,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "app" => app,
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Count one pass through a policy; `error` is `None` on success.
pub fn record_call(policy: &str, kind: PolicyKind, error: Option<ErrorKind>) {
    let outcome = error.map(|e| e.as_str()).unwrap_or("success");
    metrics::counter!(
        "resilience_calls_total",
        "policy" => policy.to_string(),
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_fallback(caller: &str, cause: ErrorKind) {
    metrics::counter!(
        "resilience_fallbacks_total",
        "caller" => caller.to_string(),
        "cause" => cause.as_str()
    )
    .increment(1);
}

pub fn record_circuit_transition(breaker: &str, to: CircuitState) {
    metrics::counter!(
        "circuit_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub fn record_instance_health(service: &str, addr: &str, healthy: bool) {
    metrics::gauge!(
        "service_instance_healthy",
        "service" => service.to_string(),
        "instance" => addr.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}
