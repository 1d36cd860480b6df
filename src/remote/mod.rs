//! Remote endpoints.
//!
//! # Data Flow
//! ```text
//! ProviderClient operation
//!     → RemoteEndpoint::get(path, request_id)
//!     → client.rs: ServicePool::resolve → HTTP GET http://{instance}/{path}
//!     → 2xx body → Ok(payload)
//!     → non-2xx or transport error → Err(CallError::RemoteFailure)
//! ```
//!
//! Deadlines are applied by the caller around `get`; a dropped call leaves
//! instance health untouched.

use futures_util::future::BoxFuture;

use crate::resilience::error::CallOutcome;

pub mod client;

pub use client::HttpRemote;

/// An external service answering GET requests with a string payload.
pub trait RemoteEndpoint: Send + Sync {
    /// `path` is relative to the instance root ("" for `/`).
    fn get(&self, path: &str, request_id: Option<String>) -> BoxFuture<'static, CallOutcome>;
}
