//! Shared utilities for the integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use cloud_resilience::config::AppConfig;
use cloud_resilience::lifecycle::startup;
use cloud_resilience::{App, Shutdown};
use tokio::net::TcpListener;

/// Defaults with every app on an ephemeral local port and metrics off.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.provider.bind_address = "127.0.0.1:0".to_string();
    config.provider.sleep_secs = 2;
    config.consumer.bind_address = "127.0.0.1:0".to_string();
    config.consumer.read_timeout_ms = 500;
    config.resilience.bind_address = "127.0.0.1:0".to_string();
    config.config_client.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    config
}

/// Start one app and return the address it listens on.
pub async fn spawn_app(app: App, config: &AppConfig, shutdown: &Shutdown) -> SocketAddr {
    let running = startup::launch(config, &[app], shutdown)
        .await
        .expect("app failed to start");
    running[0].local_addr
}

/// Start a provider, then a consumer pointed at it.
pub async fn spawn_provider_and_consumer(
    mut config: AppConfig,
    shutdown: &Shutdown,
) -> (SocketAddr, SocketAddr) {
    let provider = spawn_app(App::Provider, &config, shutdown).await;
    config.consumer.provider.instances = vec![provider.to_string()];
    let consumer = spawn_app(App::Consumer, &config, shutdown).await;
    (provider, consumer)
}

/// An address nothing listens on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub async fn get(addr: SocketAddr, path: &str) -> (reqwest::StatusCode, String) {
    let response = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
    let status = response.status();
    (status, response.text().await.unwrap())
}
