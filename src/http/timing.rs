//! Request timing middleware.
//!
//! Logs `"{path}: {ms} ms"` for every request and records it in the
//! request counters and duration histogram. Metrics are labelled with the
//! matched route template, never the raw path.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::http::server::App;
use crate::observability::metrics;

/// Route label for metrics: the route template, or `"unmatched"` when no route matched.
pub fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

pub async fn record_timing(State(app): State<App>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);

    let response = next.run(request).await;

    let elapsed = start.elapsed();
    tracing::info!(
        app = app.as_str(),
        status = response.status().as_u16(),
        "{}: {} ms",
        path,
        elapsed.as_millis()
    );
    metrics::record_request(app.as_str(), method.as_str(), &route, response.status().as_u16(), start);

    response
}
