//! Resilient service-to-service calls: a provider, a consumer calling it
//! behind a circuit breaker with fallbacks, and a demo of named resilience
//! policies.

pub mod config;
pub mod consumer;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod remote;
pub mod resilience;

pub use config::schema::AppConfig;
pub use http::{App, HttpServer};
pub use lifecycle::Shutdown;
