//! Wait between retry attempts.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Calculate exponential backoff delay with jitter.
///
/// `attempt` is the number of the attempt that just failed, starting at 1.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Jitter: 0 to 10% of the delay
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Wait before the attempt following `attempt`, as configured.
pub fn retry_delay(config: &RetryConfig, attempt: u32) -> Duration {
    if config.exponential_backoff {
        calculate_backoff(attempt, config.wait_duration_ms, config.max_wait_duration_ms)
    } else {
        Duration::from_millis(config.wait_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_calculation() {
        let b1 = calculate_backoff(1, 100, 2000);
        assert!(b1.as_millis() >= 100 && b1.as_millis() < 110);

        let b2 = calculate_backoff(2, 100, 2000);
        assert!(b2.as_millis() >= 200);

        let max = calculate_backoff(10, 100, 1000);
        assert!(max.as_millis() >= 1000 && max.as_millis() < 1100);
    }

    #[test]
    fn test_fixed_delay_ignores_attempt() {
        let config = RetryConfig {
            wait_duration_ms: 250,
            exponential_backoff: false,
            ..RetryConfig::default()
        };
        assert_eq!(retry_delay(&config, 1), Duration::from_millis(250));
        assert_eq!(retry_delay(&config, 7), Duration::from_millis(250));
    }
}
