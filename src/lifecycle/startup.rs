//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server of each selected app
//! - Bind listeners and begin accepting traffic
//! - Hand every server a shutdown receiver
//!
//! # Design Decisions
//! - Fail fast: any bind error is fatal
//! - Apps start in the order given, each only after its listener is bound

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::AppConfig;
use crate::http::{App, HttpServer};
use crate::lifecycle::Shutdown;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to bind {app} on {address}: {source}")]
    Bind {
        app: &'static str,
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// A server task that is accepting connections.
#[derive(Debug)]
pub struct RunningApp {
    pub app: App,
    pub local_addr: SocketAddr,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

/// Bind and spawn every app in `apps`.
pub async fn launch(
    config: &AppConfig,
    apps: &[App],
    shutdown: &Shutdown,
) -> Result<Vec<RunningApp>, StartupError> {
    let mut running = Vec::with_capacity(apps.len());
    for &app in apps {
        let server = HttpServer::new(app, config);
        running.push(serve(server, app.bind_address(config), shutdown).await?);
    }
    Ok(running)
}

/// Bind `address` and spawn `server` on it.
pub async fn serve(
    server: HttpServer,
    address: &str,
    shutdown: &Shutdown,
) -> Result<RunningApp, StartupError> {
    let app = server.app();
    let bind_error = |source| StartupError::Bind {
        app: app.as_str(),
        address: address.to_string(),
        source,
    };

    let listener = TcpListener::bind(address).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;
    tracing::info!(app = app.as_str(), address = %local_addr, "Listening for connections");

    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    Ok(RunningApp {
        app,
        local_addr,
        handle,
    })
}
