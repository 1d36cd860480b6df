//! Retry policy.
//!
//! # Responsibilities
//! - Re-invoke a failed call up to `max_attempts` total attempts
//! - Wait between attempts (fixed, or exponential with jitter)
//! - Report the last failure once attempts are used up
//!
//! Only failures of an actual invocation (remote failure, timeout) are
//! retried; a rejection by another policy is returned as is.

use std::future::Future;

use crate::config::RetryConfig;
use crate::resilience::backoff::retry_delay;
use crate::resilience::error::{CallError, CallOutcome};

#[derive(Debug)]
pub struct Retry {
    name: String,
    config: RetryConfig,
}

impl Retry {
    pub fn new(name: impl Into<String>, config: RetryConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub async fn execute<T, F, Fut>(&self, mut call: F) -> CallOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CallOutcome<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(retry = %self.name, attempt, "Call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= max_attempts {
                tracing::warn!(
                    retry = %self.name,
                    attempts = attempt,
                    error = %error,
                    "Retry attempts exhausted"
                );
                return Err(CallError::RetryExhausted {
                    name: self.name.clone(),
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let delay = retry_delay(&self.config, attempt);
            tracing::debug!(
                retry = %self.name,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying call"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
