//! Named resilience policies behind one type.
//!
//! [`Policy`] is what callers hold: a cheap handle to a shared rate limiter,
//! bulkhead, thread-pool bulkhead, circuit breaker or retry. Every pass through
//! a policy is counted in `resilience_calls_total`.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::config::{
    BulkheadConfig, CircuitBreakerConfig, RateLimiterConfig, RetryConfig, ThreadPoolBulkheadConfig,
};
use crate::observability::metrics;
use crate::resilience::bulkhead::Bulkhead;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::error::{CallError, CallOutcome};
use crate::resilience::rate_limiter::RateLimiter;
use crate::resilience::retries::Retry;
use crate::resilience::thread_pool_bulkhead::ThreadPoolBulkhead;

/// A repeatable remote call, already type-erased so policies can stack.
pub type BoxedCall = Arc<dyn Fn() -> BoxFuture<'static, CallOutcome> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    RateLimiter,
    Bulkhead,
    ThreadPoolBulkhead,
    CircuitBreaker,
    Retry,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::RateLimiter => "rate_limiter",
            PolicyKind::Bulkhead => "bulkhead",
            PolicyKind::ThreadPoolBulkhead => "thread_pool_bulkhead",
            PolicyKind::CircuitBreaker => "circuit_breaker",
            PolicyKind::Retry => "retry",
        }
    }
}

/// Kind-specific settings of a policy.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicySettings {
    RateLimiter(RateLimiterConfig),
    Bulkhead(BulkheadConfig),
    ThreadPoolBulkhead(ThreadPoolBulkheadConfig),
    CircuitBreaker(CircuitBreakerConfig),
    Retry(RetryConfig),
}

impl PolicySettings {
    pub fn kind(&self) -> PolicyKind {
        match self {
            PolicySettings::RateLimiter(_) => PolicyKind::RateLimiter,
            PolicySettings::Bulkhead(_) => PolicyKind::Bulkhead,
            PolicySettings::ThreadPoolBulkhead(_) => PolicyKind::ThreadPoolBulkhead,
            PolicySettings::CircuitBreaker(_) => PolicyKind::CircuitBreaker,
            PolicySettings::Retry(_) => PolicyKind::Retry,
        }
    }
}

/// Name plus settings; everything needed to build a [`Policy`].
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyConfig {
    pub name: String,
    pub settings: PolicySettings,
}

impl PolicyConfig {
    pub fn new(name: impl Into<String>, settings: PolicySettings) -> Self {
        Self {
            name: name.into(),
            settings,
        }
    }

    pub fn kind(&self) -> PolicyKind {
        self.settings.kind()
    }
}

#[derive(Clone)]
pub enum Policy {
    RateLimiter(Arc<RateLimiter>),
    Bulkhead(Arc<Bulkhead>),
    ThreadPoolBulkhead(Arc<ThreadPoolBulkhead>),
    CircuitBreaker(Arc<CircuitBreaker>),
    Retry(Arc<Retry>),
}

impl Policy {
    /// Build a fresh, unshared policy.
    pub fn from_config(config: PolicyConfig) -> Self {
        let PolicyConfig { name, settings } = config;
        match settings {
            PolicySettings::RateLimiter(c) => Policy::RateLimiter(Arc::new(RateLimiter::new(name, c))),
            PolicySettings::Bulkhead(c) => Policy::Bulkhead(Arc::new(Bulkhead::new(name, c))),
            PolicySettings::ThreadPoolBulkhead(c) => {
                Policy::ThreadPoolBulkhead(Arc::new(ThreadPoolBulkhead::new(name, c)))
            }
            PolicySettings::CircuitBreaker(c) => {
                Policy::CircuitBreaker(Arc::new(CircuitBreaker::new(name, c)))
            }
            PolicySettings::Retry(c) => Policy::Retry(Arc::new(Retry::new(name, c))),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Policy::RateLimiter(p) => p.name(),
            Policy::Bulkhead(p) => p.name(),
            Policy::ThreadPoolBulkhead(p) => p.name(),
            Policy::CircuitBreaker(p) => p.name(),
            Policy::Retry(p) => p.name(),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::RateLimiter(_) => PolicyKind::RateLimiter,
            Policy::Bulkhead(_) => PolicyKind::Bulkhead,
            Policy::ThreadPoolBulkhead(_) => PolicyKind::ThreadPoolBulkhead,
            Policy::CircuitBreaker(_) => PolicyKind::CircuitBreaker,
            Policy::Retry(_) => PolicyKind::Retry,
        }
    }

    pub fn config(&self) -> PolicyConfig {
        let settings = match self {
            Policy::RateLimiter(p) => PolicySettings::RateLimiter(p.config().clone()),
            Policy::Bulkhead(p) => PolicySettings::Bulkhead(p.config().clone()),
            Policy::ThreadPoolBulkhead(p) => PolicySettings::ThreadPoolBulkhead(p.config().clone()),
            Policy::CircuitBreaker(p) => PolicySettings::CircuitBreaker(p.config().clone()),
            Policy::Retry(p) => PolicySettings::Retry(p.config().clone()),
        };
        PolicyConfig::new(self.name(), settings)
    }

    /// Run `call` under this policy.
    ///
    /// `call` may be invoked zero times (rejected), once, or several times
    /// (retry).
    pub async fn execute<T, F, Fut>(&self, call: F) -> CallOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CallOutcome<T>> + Send + 'static,
        T: Send + 'static,
    {
        let outcome = match self {
            Policy::RateLimiter(p) => p.execute(call).await,
            Policy::Bulkhead(p) => p.execute(call).await,
            Policy::ThreadPoolBulkhead(p) => p.execute(call).await,
            Policy::CircuitBreaker(p) => p.execute(call).await,
            Policy::Retry(p) => p.execute(call).await,
        };
        metrics::record_call(self.name(), self.kind(), outcome.as_ref().err().map(CallError::kind));
        outcome
    }

    /// Wrap `call` so every invocation of the result goes through this policy.
    pub fn decorate(&self, call: BoxedCall) -> BoxedCall {
        let policy = self.clone();
        Arc::new(move || {
            let policy = policy.clone();
            let call = call.clone();
            async move { policy.execute(move || call()).await }.boxed()
        })
    }
}

impl std::fmt::Debug for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Policy")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}
