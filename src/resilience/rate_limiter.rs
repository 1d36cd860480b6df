//! Rate limiter policy.
//!
//! Keeps the admission instants of the trailing refresh period; a call is
//! admitted while fewer than `limit_for_period` instants are inside it.
//! Calls over the limit are rejected immediately, never queued.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::RateLimiterConfig;
use crate::resilience::error::{CallError, CallOutcome};

#[derive(Debug)]
pub struct RateLimiter {
    name: String,
    config: RateLimiterConfig,
    period: Duration,
    admitted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, config: RateLimiterConfig) -> Self {
        Self {
            name: name.into(),
            period: Duration::from_millis(config.limit_refresh_period_ms),
            admitted: Mutex::new(VecDeque::new()),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Take one permission if the current window has room.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut admitted = self.admitted.lock().expect("rate limiter mutex poisoned");

        while let Some(oldest) = admitted.front() {
            if now.duration_since(*oldest) >= self.period {
                admitted.pop_front();
            } else {
                break;
            }
        }

        if admitted.len() < self.config.limit_for_period as usize {
            admitted.push_back(now);
            true
        } else {
            false
        }
    }

    /// Permissions left in the current window.
    pub fn available_permissions(&self) -> usize {
        let now = Instant::now();
        let admitted = self.admitted.lock().expect("rate limiter mutex poisoned");
        let in_window = admitted
            .iter()
            .filter(|at| now.duration_since(**at) < self.period)
            .count();
        (self.config.limit_for_period as usize).saturating_sub(in_window)
    }

    pub async fn execute<T, F, Fut>(&self, call: F) -> CallOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CallOutcome<T>>,
    {
        if !self.try_acquire() {
            tracing::warn!(rate_limiter = %self.name, limit = self.config.limit_for_period, "Rate limit exceeded");
            return Err(CallError::RateLimitExceeded(self.name.clone()));
        }
        call().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(limit: u32, period_ms: u64) -> RateLimiter {
        RateLimiter::new(
            "test",
            RateLimiterConfig {
                limit_for_period: limit,
                limit_refresh_period_ms: period_ms,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_over_limit_is_rejected() {
        let limiter = limiter(3, 1_000);

        for _ in 0..3 {
            let outcome = limiter.execute(|| async { Ok::<_, CallError>("ok".to_string()) }).await;
            assert!(outcome.is_ok());
        }

        let outcome = limiter.execute(|| async { Ok::<_, CallError>("ok".to_string()) }).await;
        assert_eq!(outcome, Err(CallError::RateLimitExceeded("test".into())));
        assert_eq!(limiter.available_permissions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_rolls_forward() {
        let limiter = limiter(2, 1_000);

        assert!(limiter.try_acquire());
        tokio::time::advance(Duration::from_millis(600)).await;
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        // first admission leaves the window, second one is still inside it
        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(limiter.available_permissions(), 1);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_rejected_call_is_not_invoked() {
        let limiter = limiter(1, 60_000);
        assert!(limiter.try_acquire());

        let mut invoked = false;
        let outcome: CallOutcome = limiter
            .execute(|| {
                invoked = true;
                async { Ok::<_, CallError>("never".to_string()) }
            })
            .await;

        assert!(outcome.is_err());
        assert!(!invoked);
    }
}
