//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router of one app (provider, consumer, resilience demo, config client)
//! - Wire up middleware (request ID, tracing, timeout, timing)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::net::SocketAddr;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::request::MakeRequestUuidV4;
use crate::http::{config_client, consumer, provider, resilience, timing};

/// The services this binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum App {
    Provider,
    Consumer,
    Resilience,
    ConfigClient,
}

impl App {
    pub const ALL: [App; 4] = [App::Provider, App::Consumer, App::Resilience, App::ConfigClient];

    pub fn as_str(&self) -> &'static str {
        match self {
            App::Provider => "provider",
            App::Consumer => "consumer",
            App::Resilience => "resilience",
            App::ConfigClient => "config-client",
        }
    }

    /// Configured bind address of the app.
    pub fn bind_address<'a>(&self, config: &'a AppConfig) -> &'a str {
        match self {
            App::Provider => &config.provider.bind_address,
            App::Consumer => &config.consumer.bind_address,
            App::Resilience => &config.resilience.bind_address,
            App::ConfigClient => &config.config_client.bind_address,
        }
    }
}

/// HTTP server for one app.
pub struct HttpServer {
    app: App,
    router: Router,
}

impl HttpServer {
    /// Create the server of `app` with the given configuration.
    pub fn new(app: App, config: &AppConfig) -> Self {
        let routes = match app {
            App::Provider => provider::router(&config.provider),
            App::Consumer => consumer::router(&config.consumer),
            App::Resilience => resilience::router(&config.resilience),
            App::ConfigClient => config_client::router(&config.config_client),
        };
        Self::with_routes(app, config, routes)
    }

    /// Wrap prepared routes in the common middleware stack.
    pub fn with_routes(app: App, config: &AppConfig, routes: Router) -> Self {
        let router = Self::build_router(app, config, routes);
        Self { app, router }
    }

    /// Apply the middleware layers; the first layer in the builder sees the
    /// request first.
    #[allow(deprecated)]
    fn build_router(app: App, config: &AppConfig, routes: Router) -> Router {
        routes
            .layer(middleware::from_fn_with_state(app, timing::record_timing))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.server.request_timeout_secs,
                    ))),
            )
    }

    pub fn app(&self) -> App {
        self.app
    }

    /// The complete router, for serving or for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` turns true.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(app = self.app.as_str(), address = %addr, "HTTP server starting");

        let service = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, service)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await?;

        tracing::info!(app = self.app.as_str(), "HTTP server stopped");
        Ok(())
    }
}
