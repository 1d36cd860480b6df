//! Named policy registry.
//!
//! Policies are created lazily on first lookup, from the instance entry of
//! their kind when one exists and from the kind's defaults otherwise. Looking
//! a name up again returns the same shared policy, so its limits and window
//! apply across every caller using that name.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{json, Map, Value};

use crate::config::ResilienceConfig;
use crate::resilience::bulkhead::Bulkhead;
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::policy::{Policy, PolicyConfig, PolicyKind, PolicySettings};
use crate::resilience::rate_limiter::RateLimiter;
use crate::resilience::retries::Retry;
use crate::resilience::thread_pool_bulkhead::ThreadPoolBulkhead;

#[derive(Debug)]
pub struct PolicyRegistry {
    config: ResilienceConfig,
    rate_limiters: DashMap<String, Arc<RateLimiter>>,
    bulkheads: DashMap<String, Arc<Bulkhead>>,
    thread_pool_bulkheads: DashMap<String, Arc<ThreadPoolBulkhead>>,
    circuit_breakers: DashMap<String, Arc<CircuitBreaker>>,
    retries: DashMap<String, Arc<Retry>>,
}

impl PolicyRegistry {
    pub fn new(config: ResilienceConfig) -> Self {
        Self {
            config,
            rate_limiters: DashMap::new(),
            bulkheads: DashMap::new(),
            thread_pool_bulkheads: DashMap::new(),
            circuit_breakers: DashMap::new(),
            retries: DashMap::new(),
        }
    }

    pub fn rate_limiter(&self, name: &str) -> Arc<RateLimiter> {
        self.rate_limiters
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(rate_limiter = name, "Creating rate limiter");
                Arc::new(RateLimiter::new(name, self.config.rate_limiter.config_for(name)))
            })
            .value()
            .clone()
    }

    pub fn bulkhead(&self, name: &str) -> Arc<Bulkhead> {
        self.bulkheads
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(bulkhead = name, "Creating bulkhead");
                Arc::new(Bulkhead::new(name, self.config.bulkhead.config_for(name)))
            })
            .value()
            .clone()
    }

    pub fn thread_pool_bulkhead(&self, name: &str) -> Arc<ThreadPoolBulkhead> {
        self.thread_pool_bulkheads
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(bulkhead = name, "Creating thread pool bulkhead");
                Arc::new(ThreadPoolBulkhead::new(
                    name,
                    self.config.thread_pool_bulkhead.config_for(name),
                ))
            })
            .value()
            .clone()
    }

    pub fn circuit_breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        self.circuit_breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(circuit_breaker = name, "Creating circuit breaker");
                Arc::new(CircuitBreaker::new(name, self.config.circuit_breaker.config_for(name)))
            })
            .value()
            .clone()
    }

    pub fn retry(&self, name: &str) -> Arc<Retry> {
        self.retries
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(retry = name, "Creating retry");
                Arc::new(Retry::new(name, self.config.retry.config_for(name)))
            })
            .value()
            .clone()
    }

    /// Shared policy of the given kind and name.
    pub fn policy(&self, kind: PolicyKind, name: &str) -> Policy {
        match kind {
            PolicyKind::RateLimiter => Policy::RateLimiter(self.rate_limiter(name)),
            PolicyKind::Bulkhead => Policy::Bulkhead(self.bulkhead(name)),
            PolicyKind::ThreadPoolBulkhead => Policy::ThreadPoolBulkhead(self.thread_pool_bulkhead(name)),
            PolicyKind::CircuitBreaker => Policy::CircuitBreaker(self.circuit_breaker(name)),
            PolicyKind::Retry => Policy::Retry(self.retry(name)),
        }
    }

    /// Settings a policy of this kind and name is (or would be) built with.
    pub fn policy_config(&self, kind: PolicyKind, name: &str) -> PolicyConfig {
        let settings = match kind {
            PolicyKind::RateLimiter => PolicySettings::RateLimiter(self.config.rate_limiter.config_for(name)),
            PolicyKind::Bulkhead => PolicySettings::Bulkhead(self.config.bulkhead.config_for(name)),
            PolicyKind::ThreadPoolBulkhead => {
                PolicySettings::ThreadPoolBulkhead(self.config.thread_pool_bulkhead.config_for(name))
            }
            PolicyKind::CircuitBreaker => {
                PolicySettings::CircuitBreaker(self.config.circuit_breaker.config_for(name))
            }
            PolicyKind::Retry => PolicySettings::Retry(self.config.retry.config_for(name)),
        };
        PolicyConfig::new(name, settings)
    }

    /// Headline numbers of the default configs, keyed for `GET /check`.
    pub fn check(&self) -> Map<String, Value> {
        let mut report = Map::new();
        report.insert(
            "Bulkhead maxConcurrentCalls".to_string(),
            json!(self.config.bulkhead.defaults.max_concurrent_calls),
        );
        report.insert(
            "CircuitBreaker failureRateThreshold".to_string(),
            json!(self.config.circuit_breaker.defaults.failure_rate_threshold),
        );
        report.insert(
            "RateLimiter limitForPeriod".to_string(),
            json!(self.config.rate_limiter.defaults.limit_for_period),
        );
        report.insert(
            "ThreadPoolBulkhead max thread pool".to_string(),
            json!(self.config.thread_pool_bulkhead.defaults.max_thread_pool_size),
        );
        report.insert(
            "Retry max retry".to_string(),
            json!(self.config.retry.defaults.max_attempts),
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimiterConfig;

    fn registry() -> PolicyRegistry {
        let mut config = ResilienceConfig::default();
        config.rate_limiter.instances.insert(
            "backendA".to_string(),
            RateLimiterConfig {
                limit_for_period: 5,
                limit_refresh_period_ms: 200,
            },
        );
        PolicyRegistry::new(config)
    }

    #[test]
    fn test_same_name_same_instance() {
        let registry = registry();
        let a = registry.circuit_breaker("backendA");
        let b = registry.circuit_breaker("backendA");
        let other = registry.circuit_breaker("backendB");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));
    }

    #[test]
    fn test_instance_config_overrides_defaults() {
        let registry = registry();

        assert_eq!(registry.rate_limiter("backendA").config().limit_for_period, 5);
        assert_eq!(registry.rate_limiter("backendB").config().limit_for_period, 50);

        let policy = registry.policy(PolicyKind::RateLimiter, "backendA");
        assert_eq!(policy.config(), registry.policy_config(PolicyKind::RateLimiter, "backendA"));
    }

    #[test]
    fn test_check_reports_defaults() {
        let report = PolicyRegistry::new(ResilienceConfig::default()).check();

        assert_eq!(report["Bulkhead maxConcurrentCalls"], json!(25));
        assert_eq!(report["CircuitBreaker failureRateThreshold"], json!(50.0));
        assert_eq!(report["RateLimiter limitForPeriod"], json!(50));
        assert_eq!(report["Retry max retry"], json!(3));
        assert_eq!(report.len(), 5);
    }
}
