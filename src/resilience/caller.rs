//! Caller: policies plus fallback around one remote operation.
//!
//! ```text
//! handle(call)
//!     → policies[0] → policies[1] → ... → call()
//!     → Ok(payload)  → payload
//!     → Err(cause)   → fallback.on_rejected_or_failed(cause)
//! ```

use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::observability::metrics;
use crate::resilience::error::CallOutcome;
use crate::resilience::fallback::FallbackHandler;
use crate::resilience::policy::{BoxedCall, Policy};

#[derive(Clone)]
pub struct Caller {
    name: String,
    policies: Vec<Policy>,
    fallback: Arc<dyn FallbackHandler>,
}

impl Caller {
    pub fn new(name: impl Into<String>, fallback: Arc<dyn FallbackHandler>) -> Self {
        Self {
            name: name.into(),
            policies: Vec::new(),
            fallback,
        }
    }

    /// Add a policy. The first one added is the outermost.
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `call` through every policy; never fails.
    pub async fn handle<F, Fut>(&self, call: F) -> String
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CallOutcome> + Send + 'static,
    {
        let inner: BoxedCall = Arc::new(move || call().boxed());
        let decorated = self
            .policies
            .iter()
            .rev()
            .fold(inner, |call, policy| policy.decorate(call));

        match decorated().await {
            Ok(payload) => payload,
            Err(cause) => {
                tracing::debug!(caller = %self.name, error = %cause, "Call failed, using fallback");
                metrics::record_fallback(&self.name, cause.kind());
                self.fallback.on_rejected_or_failed(&cause)
            }
        }
    }
}

impl std::fmt::Debug for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Caller")
            .field("name", &self.name)
            .field("policies", &self.policies)
            .finish()
    }
}
