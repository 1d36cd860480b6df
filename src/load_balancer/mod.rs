//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Remote call for a service
//!     → pool.rs (healthy instances of the service)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through instances)
//!         - random.rs (pick any instance)
//!     → instance.rs (address + passive health)
//! ```
//!
//! # Design Decisions
//! - Algorithms are stateless apart from their own counter
//! - The pool filters health; algorithms only pick
//! - Health is passive: transport failures of real calls, no probes

use std::fmt::Debug;
use std::sync::Arc;

pub mod instance;
pub mod pool;
pub mod random;
pub mod round_robin;

pub use instance::ServiceInstance;
pub use pool::ServicePool;

/// Chooses one instance out of a candidate list.
pub trait LoadBalancer: Send + Sync + Debug {
    fn next_instance(&self, instances: &[Arc<ServiceInstance>]) -> Option<Arc<ServiceInstance>>;
}
