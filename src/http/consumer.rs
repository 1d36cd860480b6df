//! Consumer app: provider operations behind circuit breaker and fallbacks.

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, routing::get, Router};

use crate::config::ConsumerConfig;
use crate::consumer::ProviderClient;
use crate::http::request::request_id;

pub fn router(config: &ConsumerConfig) -> Router {
    with_client(Arc::new(ProviderClient::from_config(config)))
}

/// Router over an already built client.
pub fn with_client(client: Arc<ProviderClient>) -> Router {
    Router::new()
        .route("/", get(say_hi))
        .route("/fail", get(say_hi_with_fail))
        .route("/sleep", get(say_hi_with_sleep))
        .with_state(client)
}

async fn say_hi(State(client): State<Arc<ProviderClient>>, headers: HeaderMap) -> String {
    client.say_hi(request_id(&headers)).await
}

async fn say_hi_with_fail(State(client): State<Arc<ProviderClient>>, headers: HeaderMap) -> String {
    client.say_hi_with_fail(request_id(&headers)).await
}

async fn say_hi_with_sleep(State(client): State<Arc<ProviderClient>>, headers: HeaderMap) -> String {
    client.say_hi_with_sleep(request_id(&headers)).await
}
