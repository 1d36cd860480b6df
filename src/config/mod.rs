//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → cloned into each app at startup
//! ```
//!
//! # Design Decisions
//! - Config is loaded once; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Policy settings are grouped per kind: defaults plus named instances

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AppConfig;
pub use schema::BulkheadConfig;
pub use schema::CircuitBreakerConfig;
pub use schema::ConfigClientConfig;
pub use schema::ConsumerConfig;
pub use schema::LoadBalancingStrategy;
pub use schema::ObservabilityConfig;
pub use schema::PolicyGroup;
pub use schema::ProviderConfig;
pub use schema::RateLimiterConfig;
pub use schema::ResilienceConfig;
pub use schema::RetryConfig;
pub use schema::ServiceConfig;
pub use schema::ThreadPoolBulkheadConfig;
