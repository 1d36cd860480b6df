//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Handler:
//!     → caller.rs (stack policies, first added outermost)
//!     → policy.rs (rate limiter | bulkhead | thread pool bulkhead |
//!                  circuit breaker | retry)
//!     → remote call, bounded by timeouts.rs
//!     → Ok(payload) or Err(CallError) → fallback.rs
//! ```
//!
//! # Design Decisions
//! - Every policy is named; the registry shares one instance per name
//! - Rejections never block, except the thread-pool queue up to its wait
//! - Only invocation failures are retried, never rejections
//! - A caller always answers: failures become fallback payloads

pub mod backoff;
pub mod bulkhead;
pub mod caller;
pub mod circuit_breaker;
pub mod error;
pub mod fallback;
pub mod policy;
pub mod rate_limiter;
pub mod registry;
pub mod retries;
pub mod thread_pool_bulkhead;
pub mod timeouts;

pub use caller::Caller;
pub use error::{CallError, CallOutcome, ErrorKind};
pub use fallback::{FallbackHandler, FixedFallback};
pub use policy::{BoxedCall, Policy, PolicyConfig, PolicyKind, PolicySettings};
pub use registry::PolicyRegistry;
