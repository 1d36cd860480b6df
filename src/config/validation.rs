//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and addresses and
//! reports every problem it finds, not just the first.

use std::net::SocketAddr;

use crate::config::schema::{
    AppConfig, BulkheadConfig, CircuitBreakerConfig, PolicyGroup, RateLimiterConfig, RetryConfig,
    ThreadPoolBulkheadConfig,
};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a socket address")]
    InvalidAddress { field: String, value: String },

    #[error("{field}: {reason}")]
    OutOfRange { field: String, reason: &'static str },

    #[error("service '{service}' has no instances")]
    NoInstances { service: String },
}

/// Upper bound for every count or size a policy preallocates or turns into permits.
pub const MAX_POLICY_SIZE: usize = 1_000_000;

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "provider.bind_address", &config.provider.bind_address);
    check_address(&mut errors, "consumer.bind_address", &config.consumer.bind_address);
    check_address(&mut errors, "resilience.bind_address", &config.resilience.bind_address);
    check_address(&mut errors, "config_client.bind_address", &config.config_client.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    positive(&mut errors, "server.request_timeout_secs", config.server.request_timeout_secs);

    let service = &config.consumer.provider;
    if service.instances.is_empty() {
        errors.push(ValidationError::NoInstances {
            service: service.name.clone(),
        });
    }
    for (i, instance) in service.instances.iter().enumerate() {
        check_address(&mut errors, &format!("consumer.provider.instances[{i}]"), instance);
    }
    positive(&mut errors, "consumer.provider.unhealthy_threshold", service.unhealthy_threshold as u64);
    positive(&mut errors, "consumer.provider.healthy_threshold", service.healthy_threshold as u64);
    positive(&mut errors, "consumer.read_timeout_ms", config.consumer.read_timeout_ms);
    check_circuit_breaker(&mut errors, "consumer.circuit_breaker", &config.consumer.circuit_breaker);

    let resilience = &config.resilience;
    check_group(&mut errors, "resilience.rate_limiter", &resilience.rate_limiter, check_rate_limiter);
    check_group(&mut errors, "resilience.bulkhead", &resilience.bulkhead, check_bulkhead);
    check_group(
        &mut errors,
        "resilience.thread_pool_bulkhead",
        &resilience.thread_pool_bulkhead,
        check_thread_pool_bulkhead,
    );
    check_group(&mut errors, "resilience.circuit_breaker", &resilience.circuit_breaker, check_circuit_breaker);
    check_group(&mut errors, "resilience.retry", &resilience.retry, check_retry);

    check_timings(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
}

fn positive(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::OutOfRange {
            field: field.to_string(),
            reason: "must be greater than zero",
        });
    }
}

fn at_most(errors: &mut Vec<ValidationError>, field: &str, value: usize) {
    if value > MAX_POLICY_SIZE {
        errors.push(ValidationError::OutOfRange {
            field: field.to_string(),
            reason: "must not exceed 1000000",
        });
    }
}

/// Deadlines that must end before the server's own request timeout, or the
/// client sees a 408 instead of a fallback.
fn check_timings(errors: &mut Vec<ValidationError>, config: &AppConfig) {
    let limit_ms = config.server.request_timeout_secs.saturating_mul(1_000);

    ends_before(errors, "consumer.read_timeout_ms".to_string(), config.consumer.read_timeout_ms, limit_ms);

    let latency = config.resilience.simulated_latency_ms;
    let pools = &config.resilience.thread_pool_bulkhead;
    ends_before(
        errors,
        "resilience.thread_pool_bulkhead.defaults.queue_wait_ms".to_string(),
        pools.defaults.queue_wait_ms.saturating_add(latency),
        limit_ms,
    );
    for (name, pool) in &pools.instances {
        ends_before(
            errors,
            format!("resilience.thread_pool_bulkhead.instances.{name}.queue_wait_ms"),
            pool.queue_wait_ms.saturating_add(latency),
            limit_ms,
        );
    }
}

fn ends_before(errors: &mut Vec<ValidationError>, field: String, value_ms: u64, limit_ms: u64) {
    if value_ms >= limit_ms {
        errors.push(ValidationError::OutOfRange {
            field,
            reason: "must end before server.request_timeout_secs",
        });
    }
}

fn check_group<T>(
    errors: &mut Vec<ValidationError>,
    prefix: &str,
    group: &PolicyGroup<T>,
    check: fn(&mut Vec<ValidationError>, &str, &T),
) {
    check(errors, &format!("{prefix}.defaults"), &group.defaults);
    for (name, config) in &group.instances {
        check(errors, &format!("{prefix}.instances.{name}"), config);
    }
}

fn check_rate_limiter(errors: &mut Vec<ValidationError>, prefix: &str, config: &RateLimiterConfig) {
    positive(errors, &format!("{prefix}.limit_for_period"), config.limit_for_period as u64);
    at_most(errors, &format!("{prefix}.limit_for_period"), config.limit_for_period as usize);
    positive(errors, &format!("{prefix}.limit_refresh_period_ms"), config.limit_refresh_period_ms);
}

fn check_bulkhead(errors: &mut Vec<ValidationError>, prefix: &str, config: &BulkheadConfig) {
    positive(errors, &format!("{prefix}.max_concurrent_calls"), config.max_concurrent_calls as u64);
    at_most(errors, &format!("{prefix}.max_concurrent_calls"), config.max_concurrent_calls);
}

fn check_thread_pool_bulkhead(
    errors: &mut Vec<ValidationError>,
    prefix: &str,
    config: &ThreadPoolBulkheadConfig,
) {
    positive(errors, &format!("{prefix}.max_thread_pool_size"), config.max_thread_pool_size as u64);
    at_most(errors, &format!("{prefix}.max_thread_pool_size"), config.max_thread_pool_size);
    at_most(errors, &format!("{prefix}.queue_capacity"), config.queue_capacity);
}

fn check_circuit_breaker(errors: &mut Vec<ValidationError>, prefix: &str, config: &CircuitBreakerConfig) {
    if !(config.failure_rate_threshold > 0.0 && config.failure_rate_threshold <= 100.0) {
        errors.push(ValidationError::OutOfRange {
            field: format!("{prefix}.failure_rate_threshold"),
            reason: "must be in (0, 100]",
        });
    }
    positive(errors, &format!("{prefix}.sliding_window_size"), config.sliding_window_size as u64);
    at_most(errors, &format!("{prefix}.sliding_window_size"), config.sliding_window_size);
    positive(
        errors,
        &format!("{prefix}.minimum_number_of_calls"),
        config.minimum_number_of_calls as u64,
    );
    at_most(errors, &format!("{prefix}.minimum_number_of_calls"), config.minimum_number_of_calls);
}

fn check_retry(errors: &mut Vec<ValidationError>, prefix: &str, config: &RetryConfig) {
    positive(errors, &format!("{prefix}.max_attempts"), config.max_attempts as u64);
    if config.exponential_backoff && config.max_wait_duration_ms < config.wait_duration_ms {
        errors.push(ValidationError::OutOfRange {
            field: format!("{prefix}.max_wait_duration_ms"),
            reason: "must not be below wait_duration_ms",
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.provider.bind_address = "not-an-address".into();
        config.consumer.provider.instances.clear();
        config.resilience.circuit_breaker.defaults.failure_rate_threshold = 150.0;
        config
            .resilience
            .retry
            .instances
            .insert("testRetry".into(), RetryConfig { max_attempts: 0, ..RetryConfig::default() });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::NoInstances {
            service: "openfeign-provider".into()
        }));
        assert!(errors.iter().any(|e| e.to_string().contains("instances.testRetry.max_attempts")));
    }

    #[test]
    fn test_metrics_address_ignored_when_disabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nowhere".into();
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_oversized_policies_are_rejected() {
        let mut config = AppConfig::default();
        config.resilience.circuit_breaker.defaults.sliding_window_size = usize::MAX;
        config.consumer.circuit_breaker.minimum_number_of_calls = MAX_POLICY_SIZE + 1;
        config.resilience.bulkhead.defaults.max_concurrent_calls = usize::MAX;
        config.resilience.thread_pool_bulkhead.defaults.queue_capacity = usize::MAX;
        config.resilience.rate_limiter.defaults.limit_for_period = u32::MAX;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<String> = errors
            .iter()
            .map(|e| match e {
                ValidationError::OutOfRange { field, .. } => field.clone(),
                other => panic!("unexpected error: {other}"),
            })
            .collect();
        assert_eq!(fields.len(), 5, "fields: {fields:?}");
        assert!(fields.contains(&"resilience.circuit_breaker.defaults.sliding_window_size".to_string()));
        assert!(fields.contains(&"consumer.circuit_breaker.minimum_number_of_calls".to_string()));
        assert!(fields.contains(&"resilience.thread_pool_bulkhead.defaults.queue_capacity".to_string()));
    }

    #[test]
    fn test_largest_policy_sizes_are_accepted() {
        let mut config = AppConfig::default();
        config.resilience.circuit_breaker.defaults.sliding_window_size = MAX_POLICY_SIZE;
        config.resilience.thread_pool_bulkhead.defaults.max_thread_pool_size = MAX_POLICY_SIZE;
        config.resilience.thread_pool_bulkhead.defaults.queue_capacity = MAX_POLICY_SIZE;
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_deadlines_must_end_before_request_timeout() {
        let mut config = AppConfig::default();
        config.server.request_timeout_secs = 2;
        config.consumer.read_timeout_ms = 2_000;
        config.resilience.simulated_latency_ms = 500;
        config.resilience.thread_pool_bulkhead.defaults.queue_wait_ms = 1_000;
        config.resilience.thread_pool_bulkhead.instances.insert(
            "testThreadPoolBulkhead".into(),
            ThreadPoolBulkheadConfig {
                queue_wait_ms: 1_500,
                ..ThreadPoolBulkheadConfig::default()
            },
        );

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::OutOfRange {
                    field: "consumer.read_timeout_ms".into(),
                    reason: "must end before server.request_timeout_secs",
                },
                ValidationError::OutOfRange {
                    field: "resilience.thread_pool_bulkhead.instances.testThreadPoolBulkhead.queue_wait_ms"
                        .into(),
                    reason: "must end before server.request_timeout_secs",
                },
            ]
        );
    }
}
