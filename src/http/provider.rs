//! Provider app: the plain remote service.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Router};

use crate::config::ProviderConfig;

#[derive(Debug, Clone)]
struct ProviderState {
    sleep: Duration,
}

pub fn router(config: &ProviderConfig) -> Router {
    let state = ProviderState {
        sleep: Duration::from_secs(config.sleep_secs),
    };
    Router::new()
        .route("/", get(say_hi))
        .route("/fail", get(say_hi_with_fail))
        .route("/sleep", get(say_hi_with_sleep))
        .with_state(state)
}

async fn say_hi() -> &'static str {
    "hi, this is from open feign provider"
}

async fn say_hi_with_fail() -> (StatusCode, &'static str) {
    tracing::error!("Provider failing on purpose");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "hi, this is from open feign provider with fail",
    )
}

async fn say_hi_with_sleep(State(state): State<ProviderState>) -> String {
    tokio::time::sleep(state.sleep).await;
    format!(
        "hi, this is from open feign provider with sleep {}s",
        state.sleep.as_secs()
    )
}
