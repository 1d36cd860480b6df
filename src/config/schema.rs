//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the demo
//! services. All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Settings shared by every HTTP app.
    pub server: ServerConfig,

    /// The plain remote service.
    pub provider: ProviderConfig,

    /// The service calling the provider with fallbacks.
    pub consumer: ConsumerConfig,

    /// The policy demo service and its named policies.
    pub resilience: ResilienceConfig,

    /// The service echoing externally configured values.
    pub config_client: ConfigClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Settings shared by every HTTP app.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Hard limit for handling one inbound request, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}

/// Provider app configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Bind address (e.g., "0.0.0.0:8010").
    pub bind_address: String,

    /// How long `GET /sleep` stalls before answering.
    pub sleep_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8010".to_string(),
            sleep_secs: 10,
        }
    }
}

/// Consumer app configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Bind address (e.g., "0.0.0.0:8020").
    pub bind_address: String,

    /// The provider service and where its instances live.
    pub provider: ServiceConfig,

    /// TCP connect timeout for provider calls, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Deadline for a whole provider call, in milliseconds.
    pub read_timeout_ms: u64,

    /// Breaker settings; each provider operation gets its own breaker.
    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8020".to_string(),
            provider: ServiceConfig::default(),
            connect_timeout_ms: 2_000,
            read_timeout_ms: 5_000,
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// A named remote service resolved through a static instance list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Logical service name used in logs and metrics.
    pub name: String,

    /// Instance addresses (e.g., "127.0.0.1:8010").
    pub instances: Vec<String>,

    /// How an instance is picked for each call.
    pub strategy: LoadBalancingStrategy,

    /// Consecutive transport failures before an instance is skipped.
    pub unhealthy_threshold: u32,

    /// Consecutive successes before a skipped instance is used again.
    pub healthy_threshold: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "openfeign-provider".to_string(),
            instances: vec!["127.0.0.1:8010".to_string()],
            strategy: LoadBalancingStrategy::RoundRobin,
            unhealthy_threshold: 3,
            healthy_threshold: 1,
        }
    }
}

/// Instance selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancingStrategy {
    #[default]
    RoundRobin,
    Random,
}

/// Resilience demo app configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Bind address (e.g., "0.0.0.0:8030").
    pub bind_address: String,

    /// Artificial work time of each guarded demo call, in milliseconds.
    pub simulated_latency_ms: u64,

    pub rate_limiter: PolicyGroup<RateLimiterConfig>,
    pub bulkhead: PolicyGroup<BulkheadConfig>,
    pub thread_pool_bulkhead: PolicyGroup<ThreadPoolBulkheadConfig>,
    pub circuit_breaker: PolicyGroup<CircuitBreakerConfig>,
    pub retry: PolicyGroup<RetryConfig>,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8030".to_string(),
            simulated_latency_ms: 100,
            rate_limiter: PolicyGroup::default(),
            bulkhead: PolicyGroup::default(),
            thread_pool_bulkhead: PolicyGroup::default(),
            circuit_breaker: PolicyGroup::default(),
            retry: PolicyGroup::default(),
        }
    }
}

/// Config client app configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigClientConfig {
    /// Bind address (e.g., "0.0.0.0:8040").
    pub bind_address: String,

    pub value1: i64,
    pub value2: String,
}

impl Default for ConfigClientConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8040".to_string(),
            value1: 1,
            value2: "default".to_string(),
        }
    }
}

/// Default settings for one policy kind plus per-name overrides.
///
/// A name without an entry in `instances` uses `defaults`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct PolicyGroup<T> {
    pub defaults: T,
    pub instances: HashMap<String, T>,
}

impl<T: Clone> PolicyGroup<T> {
    /// Settings for the named policy.
    pub fn config_for(&self, name: &str) -> T {
        self.instances
            .get(name)
            .unwrap_or(&self.defaults)
            .clone()
    }
}

/// Rate limiter settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    /// Calls admitted per refresh period.
    pub limit_for_period: u32,

    /// Length of the rolling window in milliseconds.
    pub limit_refresh_period_ms: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit_for_period: 50,
            limit_refresh_period_ms: 1_000,
        }
    }
}

/// Semaphore bulkhead settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BulkheadConfig {
    /// Maximum in-flight calls.
    pub max_concurrent_calls: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 25,
        }
    }
}

/// Thread-pool bulkhead settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThreadPoolBulkheadConfig {
    /// Calls running at once on worker tasks.
    pub max_thread_pool_size: usize,

    /// Calls allowed to wait for a free worker.
    pub queue_capacity: usize,

    /// How long a queued call waits for a worker before rejection, in milliseconds.
    pub queue_wait_ms: u64,
}

impl Default for ThreadPoolBulkheadConfig {
    fn default() -> Self {
        Self {
            max_thread_pool_size: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            queue_capacity: 100,
            queue_wait_ms: 1_000,
        }
    }
}

/// Circuit breaker settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failure percentage (0, 100] that opens the circuit.
    pub failure_rate_threshold: f32,

    /// Number of trailing outcomes considered.
    pub sliding_window_size: usize,

    /// Outcomes required before the failure rate is evaluated.
    pub minimum_number_of_calls: usize,

    /// Cool-down spent Open before a trial call, in milliseconds.
    pub wait_duration_in_open_state_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            sliding_window_size: 100,
            minimum_number_of_calls: 100,
            wait_duration_in_open_state_ms: 60_000,
        }
    }
}

/// Retry settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first one.
    pub max_attempts: u32,

    /// Wait between attempts in milliseconds.
    pub wait_duration_ms: u64,

    /// Double the wait after each failed attempt (with jitter).
    pub exponential_backoff: bool,

    /// Upper bound for an exponential wait in milliseconds.
    pub max_wait_duration_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait_duration_ms: 500,
            exponential_backoff: false,
            max_wait_duration_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [consumer.provider]
            instances = ["10.0.0.1:8010", "10.0.0.2:8010"]
            strategy = "random"

            [resilience.bulkhead.defaults]
            max_concurrent_calls = 5

            [resilience.rate_limiter.instances.testRateLimiter]
            limit_for_period = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.consumer.provider.instances.len(), 2);
        assert_eq!(config.consumer.provider.strategy, LoadBalancingStrategy::Random);
        assert_eq!(config.consumer.provider.name, "openfeign-provider");
        assert_eq!(config.resilience.bulkhead.defaults.max_concurrent_calls, 5);
        assert_eq!(config.provider.sleep_secs, 10);

        let limiter = config.resilience.rate_limiter.config_for("testRateLimiter");
        assert_eq!(limiter.limit_for_period, 2);
        assert_eq!(limiter.limit_refresh_period_ms, 1_000);
    }

    #[test]
    fn test_unknown_policy_name_uses_defaults() {
        let group = PolicyGroup::<RetryConfig>::default();
        assert_eq!(group.config_for("anything"), RetryConfig::default());
    }
}
