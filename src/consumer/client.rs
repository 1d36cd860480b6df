//! Provider client with circuit breakers, timeout and fallbacks.
//!
//! Every operation runs as
//! `circuit breaker → timeout(read_timeout) → remote GET`; any failure or
//! rejection turns into the operation's fallback message. Each operation has
//! its own breaker, named `{service}#{operation}`, so a failing endpoint
//! never degrades the others.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ConsumerConfig;
use crate::consumer::fallback::{ProviderFallback, ProviderOperation};
use crate::load_balancer::ServicePool;
use crate::remote::{HttpRemote, RemoteEndpoint};
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::policy::Policy;
use crate::resilience::timeouts::with_timeout;
use crate::resilience::Caller;

struct GuardedOperation {
    caller: Caller,
    breaker: Arc<CircuitBreaker>,
}

pub struct ProviderClient {
    remote: Arc<dyn RemoteEndpoint>,
    read_timeout: Duration,
    /// Indexed by `ProviderOperation::index`.
    operations: [GuardedOperation; 3],
}

impl ProviderClient {
    pub fn new(remote: Arc<dyn RemoteEndpoint>, config: &ConsumerConfig) -> Self {
        let operations = ProviderOperation::ALL.map(|operation| {
            let breaker = Arc::new(CircuitBreaker::new(
                format!("{}#{}", config.provider.name, operation.as_str()),
                config.circuit_breaker.clone(),
            ));
            let caller = Caller::new(operation.as_str(), Arc::new(ProviderFallback::new(operation)))
                .with_policy(Policy::CircuitBreaker(breaker.clone()));
            GuardedOperation { caller, breaker }
        });

        Self {
            remote,
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            operations,
        }
    }

    /// Client calling the configured provider instances over HTTP.
    pub fn from_config(config: &ConsumerConfig) -> Self {
        let pool = Arc::new(ServicePool::from_config(&config.provider));
        tracing::info!(
            service = %pool.name(),
            instances = pool.instances().len(),
            "Provider pool ready"
        );
        let remote = HttpRemote::new(pool, Duration::from_millis(config.connect_timeout_ms));
        Self::new(Arc::new(remote), config)
    }

    pub fn circuit_breaker(&self, operation: ProviderOperation) -> &Arc<CircuitBreaker> {
        &self.operations[operation.index()].breaker
    }

    pub async fn say_hi(&self, request_id: Option<String>) -> String {
        self.call(ProviderOperation::SayHi, request_id).await
    }

    pub async fn say_hi_with_fail(&self, request_id: Option<String>) -> String {
        self.call(ProviderOperation::SayHiWithFail, request_id).await
    }

    pub async fn say_hi_with_sleep(&self, request_id: Option<String>) -> String {
        self.call(ProviderOperation::SayHiWithSleep, request_id).await
    }

    async fn call(&self, operation: ProviderOperation, request_id: Option<String>) -> String {
        let caller = &self.operations[operation.index()].caller;
        let remote = self.remote.clone();
        let limit = self.read_timeout;

        caller
            .handle(move || with_timeout(limit, remote.get(operation.path(), request_id.clone())))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitBreakerConfig;
    use crate::resilience::circuit_breaker::CircuitState;
    use crate::resilience::error::{CallError, CallOutcome};
    use futures_util::future::BoxFuture;
    use futures_util::FutureExt;
    use std::sync::Mutex;

    /// Answers from a script keyed by path and remembers what it was asked.
    #[derive(Default)]
    struct FakeRemote {
        delay: Option<Duration>,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl RemoteEndpoint for FakeRemote {
        fn get(&self, path: &str, request_id: Option<String>) -> BoxFuture<'static, CallOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), request_id));
            let delay = self.delay;
            let path = path.to_string();
            async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                match path.as_str() {
                    "fail" => Err(CallError::RemoteFailure("500 Internal Server Error".into())),
                    _ => Ok(format!("provider /{path}")),
                }
            }
            .boxed()
        }
    }

    fn config(read_timeout_ms: u64) -> ConsumerConfig {
        ConsumerConfig {
            read_timeout_ms,
            circuit_breaker: CircuitBreakerConfig {
                failure_rate_threshold: 50.0,
                sliding_window_size: 4,
                minimum_number_of_calls: 4,
                wait_duration_in_open_state_ms: 60_000,
            },
            ..ConsumerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_success_and_fallback() {
        let remote = Arc::new(FakeRemote::default());
        let client = ProviderClient::new(remote.clone(), &config(1_000));

        assert_eq!(client.say_hi(Some("req-1".into())).await, "provider /");
        assert_eq!(
            client.say_hi_with_fail(None).await,
            "hi, this is from open feign customer call back, sayHiWithFail"
        );

        let calls = remote.calls.lock().unwrap().clone();
        assert_eq!(calls[0], ("".to_string(), Some("req-1".to_string())));
        assert_eq!(calls[1].0, "fail");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_times_out_to_fallback() {
        let remote = Arc::new(FakeRemote {
            delay: Some(Duration::from_secs(10)),
            ..FakeRemote::default()
        });
        let client = ProviderClient::new(remote, &config(200));

        assert_eq!(
            client.say_hi_with_sleep(None).await,
            "hi, this is from open feign customer call back, sayHiWithSleep"
        );
    }

    #[tokio::test]
    async fn test_failing_operation_opens_only_its_own_breaker() {
        let remote = Arc::new(FakeRemote::default());
        let client = ProviderClient::new(remote.clone(), &config(1_000));

        for _ in 0..4 {
            client.say_hi_with_fail(None).await;
        }
        let failing = client.circuit_breaker(ProviderOperation::SayHiWithFail);
        assert_eq!(failing.state(), CircuitState::Open);
        assert_eq!(failing.name(), "openfeign-provider#sayHiWithFail");
        assert_eq!(
            client.circuit_breaker(ProviderOperation::SayHi).state(),
            CircuitState::Closed
        );

        // the open breaker rejects without reaching the remote
        assert_eq!(
            client.say_hi_with_fail(None).await,
            "hi, this is from open feign customer call back, sayHiWithFail"
        );
        assert_eq!(remote.calls.lock().unwrap().len(), 4);

        // other operations still reach the provider
        assert_eq!(client.say_hi(None).await, "provider /");
        assert_eq!(client.say_hi_with_sleep(None).await, "provider /sleep");
        assert_eq!(remote.calls.lock().unwrap().len(), 6);
    }
}
