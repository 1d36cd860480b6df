//! Config client app: echoes two values from the configuration file.

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};

use crate::config::ConfigClientConfig;

pub fn router(config: &ConfigClientConfig) -> Router {
    Router::new()
        .route("/", get(show_values))
        .with_state(Arc::new(config.clone()))
}

async fn show_values(State(config): State<Arc<ConfigClientConfig>>) -> String {
    tracing::info!(value1 = config.value1, "Configured value1");
    tracing::info!(value2 = %config.value2, "Configured value2");
    format!("{} {}", config.value1, config.value2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_echoes_configured_values() {
        let config = ConfigClientConfig {
            value1: 42,
            value2: "from file".to_string(),
            ..ConfigClientConfig::default()
        };

        let response = router(&config)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"42 from file");
    }
}
