//! Semaphore bulkhead.
//!
//! Caps the number of calls in flight at `max_concurrent_calls`. A call that
//! finds no free permit is rejected at once; the permit is released when the
//! call finishes or is cancelled.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::BulkheadConfig;
use crate::resilience::error::{CallError, CallOutcome};

#[derive(Debug)]
pub struct Bulkhead {
    name: String,
    config: BulkheadConfig,
    permits: Arc<Semaphore>,
}

impl Bulkhead {
    pub fn new(name: impl Into<String>, config: BulkheadConfig) -> Self {
        Self {
            name: name.into(),
            permits: Arc::new(Semaphore::new(
                config.max_concurrent_calls.min(Semaphore::MAX_PERMITS),
            )),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &BulkheadConfig {
        &self.config
    }

    /// Free slots right now.
    pub fn available_concurrent_calls(&self) -> usize {
        self.permits.available_permits()
    }

    pub async fn execute<T, F, Fut>(&self, call: F) -> CallOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CallOutcome<T>>,
    {
        let _permit = match self.permits.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(
                    bulkhead = %self.name,
                    max_concurrent_calls = self.config.max_concurrent_calls,
                    "Bulkhead full"
                );
                return Err(CallError::BulkheadFull(self.name.clone()));
            }
        };
        call().await
    }
}
