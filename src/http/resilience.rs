//! Resilience demo app.
//!
//! Each `/test*` endpoint runs a small piece of work through one named policy
//! from the registry and answers `"ok {n}"` (shared counter) or, when the
//! policy rejects or the work fails, `"ok fallback"`.
//!
//! | Endpoint                  | Policy                 | Work              |
//! |---------------------------|------------------------|-------------------|
//! | `/testRateLimiter`        | rate limiter           | succeeds          |
//! | `/testBulkhead`           | semaphore bulkhead     | succeeds          |
//! | `/testThreadPoolBulkhead` | thread-pool bulkhead   | succeeds          |
//! | `/testCircuitBreaker`     | circuit breaker        | fails every other |
//! | `/testRetry`              | retry                  | always fails      |

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{Map, Value};

use crate::config::ResilienceConfig;
use crate::resilience::error::{CallError, CallOutcome};
use crate::resilience::{Caller, FallbackHandler, FixedFallback, PolicyKind, PolicyRegistry};

#[derive(Debug, Clone, Copy)]
enum Work {
    Succeed,
    FailEveryOther,
    AlwaysFail,
}

#[derive(Clone)]
pub struct DemoState {
    registry: Arc<PolicyRegistry>,
    counter: Arc<AtomicU64>,
    latency: Duration,
    rate_limiter: Caller,
    bulkhead: Caller,
    thread_pool_bulkhead: Caller,
    circuit_breaker: Caller,
    retry: Caller,
}

impl DemoState {
    pub fn new(config: &ResilienceConfig) -> Self {
        let registry = Arc::new(PolicyRegistry::new(config.clone()));
        let fallback: Arc<dyn FallbackHandler> = Arc::new(FixedFallback::default());
        let caller = |kind: PolicyKind, name: &str| {
            Caller::new(name, fallback.clone()).with_policy(registry.policy(kind, name))
        };

        Self {
            rate_limiter: caller(PolicyKind::RateLimiter, "testRateLimiter"),
            bulkhead: caller(PolicyKind::Bulkhead, "testBulkhead"),
            thread_pool_bulkhead: caller(PolicyKind::ThreadPoolBulkhead, "testThreadPoolBulkhead"),
            circuit_breaker: caller(PolicyKind::CircuitBreaker, "testCircuitBreaker"),
            retry: caller(PolicyKind::Retry, "testRetry"),
            counter: Arc::new(AtomicU64::new(0)),
            latency: Duration::from_millis(config.simulated_latency_ms),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<PolicyRegistry> {
        &self.registry
    }

    async fn invoke(&self, caller: &Caller, work: Work) -> String {
        let counter = self.counter.clone();
        let latency = self.latency;
        caller
            .handle(move || do_work(counter.clone(), latency, work))
            .await
    }
}

async fn do_work(counter: Arc<AtomicU64>, latency: Duration, work: Work) -> CallOutcome {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    match work {
        Work::Succeed => Ok(format!("ok {}", counter.fetch_add(1, Ordering::SeqCst))),
        Work::FailEveryOther => {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 0 {
                Err(CallError::RemoteFailure("random exception".to_string()))
            } else {
                Ok(format!("ok {n}"))
            }
        }
        Work::AlwaysFail => Err(CallError::RemoteFailure("exception".to_string())),
    }
}

pub fn router(config: &ResilienceConfig) -> Router {
    with_state(DemoState::new(config))
}

pub fn with_state(state: DemoState) -> Router {
    Router::new()
        .route("/testRateLimiter", get(test_rate_limiter))
        .route("/testBulkhead", get(test_bulkhead))
        .route("/testThreadPoolBulkhead", get(test_thread_pool_bulkhead))
        .route("/testCircuitBreaker", get(test_circuit_breaker))
        .route("/testRetry", get(test_retry))
        .route("/check", get(check))
        .with_state(state)
}

async fn test_rate_limiter(State(state): State<DemoState>) -> String {
    state.invoke(&state.rate_limiter, Work::Succeed).await
}

async fn test_bulkhead(State(state): State<DemoState>) -> String {
    state.invoke(&state.bulkhead, Work::Succeed).await
}

async fn test_thread_pool_bulkhead(State(state): State<DemoState>) -> String {
    state.invoke(&state.thread_pool_bulkhead, Work::Succeed).await
}

async fn test_circuit_breaker(State(state): State<DemoState>) -> String {
    state.invoke(&state.circuit_breaker, Work::FailEveryOther).await
}

async fn test_retry(State(state): State<DemoState>) -> String {
    state.invoke(&state.retry, Work::AlwaysFail).await
}

async fn check(State(state): State<DemoState>) -> Json<Map<String, Value>> {
    Json(state.registry.check())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_registry_policy_backs_the_endpoint() {
        let state = DemoState::new(&ResilienceConfig::default());
        let shared = state.registry().bulkhead("testBulkhead");
        let before = shared.available_concurrent_calls();

        assert_eq!(state.invoke(&state.bulkhead, Work::Succeed).await, "ok 0");
        assert_eq!(shared.available_concurrent_calls(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_endpoint_falls_back() {
        let state = DemoState::new(&ResilienceConfig::default());
        assert_eq!(state.invoke(&state.retry, Work::AlwaysFail).await, "ok fallback");
    }
}
