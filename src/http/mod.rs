//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID generated or kept)
//!     → timing.rs (duration log + metrics)
//!     → provider.rs | consumer.rs | resilience.rs | config_client.rs (app handlers)
//!     → Send to client
//! ```

pub mod config_client;
pub mod consumer;
pub mod provider;
pub mod request;
pub mod resilience;
pub mod server;
pub mod timing;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::{App, HttpServer};
