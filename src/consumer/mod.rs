//! Provider consumer.
//!
//! # Data Flow
//! ```text
//! consumer handler
//!     → client.rs (ProviderClient operation, its circuit breaker + timeout)
//!     → remote (HTTP GET on a provider instance)
//!     → payload, or fallback.rs message for the operation
//! ```

pub mod client;
pub mod fallback;

pub use client::ProviderClient;
pub use fallback::{ProviderFallback, ProviderOperation};
