//! Thread-pool bulkhead.
//!
//! Calls run on spawned worker tasks, at most `max_thread_pool_size` at a
//! time. Up to `queue_capacity` further calls wait for a worker, each for at
//! most `queue_wait_ms`; anything beyond pool + queue is rejected at once.
//!
//! ```text
//! call → admission slot? ──no──→ BulkheadFull
//!            │yes
//!            ▼
//!        worker slot within queue_wait? ──no──→ BulkheadFull
//!            │yes
//!            ▼
//!        tokio::spawn(call) → outcome
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::ThreadPoolBulkheadConfig;
use crate::resilience::error::{CallError, CallOutcome};

#[derive(Debug)]
pub struct ThreadPoolBulkhead {
    name: String,
    config: ThreadPoolBulkheadConfig,
    /// Pool plus queue; held for the whole life of a call.
    admission: Arc<Semaphore>,
    /// Calls actually running.
    workers: Arc<Semaphore>,
}

impl ThreadPoolBulkhead {
    pub fn new(name: impl Into<String>, config: ThreadPoolBulkheadConfig) -> Self {
        Self {
            name: name.into(),
            admission: Arc::new(Semaphore::new(
                config
                    .max_thread_pool_size
                    .saturating_add(config.queue_capacity)
                    .min(Semaphore::MAX_PERMITS),
            )),
            workers: Arc::new(Semaphore::new(
                config.max_thread_pool_size.min(Semaphore::MAX_PERMITS),
            )),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ThreadPoolBulkheadConfig {
        &self.config
    }

    /// Idle workers right now.
    pub fn available_workers(&self) -> usize {
        self.workers.available_permits()
    }

    fn full(&self, reason: &'static str) -> CallError {
        tracing::warn!(
            bulkhead = %self.name,
            max_thread_pool_size = self.config.max_thread_pool_size,
            queue_capacity = self.config.queue_capacity,
            reason,
            "Thread pool bulkhead full"
        );
        CallError::BulkheadFull(self.name.clone())
    }

    pub async fn execute<T, F, Fut>(&self, call: F) -> CallOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CallOutcome<T>> + Send + 'static,
        T: Send + 'static,
    {
        let admission = self
            .admission
            .clone()
            .try_acquire_owned()
            .map_err(|_| self.full("queue full"))?;

        let queue_wait = Duration::from_millis(self.config.queue_wait_ms);
        let worker = match tokio::time::timeout(queue_wait, self.workers.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) | Err(_) => return Err(self.full("no worker within queue wait")),
        };
        let task = call();
        let handle = tokio::spawn(async move {
            let _slots = (admission, worker);
            task.await
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(bulkhead = %self.name, error = %e, "Worker task failed");
                Err(CallError::RemoteFailure(format!("worker task failed: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;

    fn pool(size: usize, queue: usize, wait_ms: u64) -> ThreadPoolBulkhead {
        ThreadPoolBulkhead::new(
            "pool",
            ThreadPoolBulkheadConfig {
                max_thread_pool_size: size,
                queue_capacity: queue,
                queue_wait_ms: wait_ms,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_overflow_beyond_pool_and_queue_is_rejected() {
        let bulkhead = pool(2, 1, 10_000);

        let calls = (0..5).map(|i| {
            bulkhead.execute(move || async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, CallError>(i)
            })
        });
        let outcomes = join_all(calls).await;

        // two run, one waits in the queue and runs afterwards, two bounce
        let successes = outcomes.iter().filter(|o| o.is_ok()).count();
        assert_eq!(successes, 3);
        assert_eq!(
            outcomes.iter().filter(|o| matches!(o, Err(CallError::BulkheadFull(_)))).count(),
            2
        );
        assert_eq!(bulkhead.available_workers(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_call_times_out() {
        let bulkhead = pool(1, 1, 50);

        let slow = bulkhead.execute(|| async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, CallError>("slow")
        });
        let queued = bulkhead.execute(|| async { Ok::<_, CallError>("queued") });

        let (slow, queued) = tokio::join!(slow, queued);
        assert_eq!(slow, Ok("slow"));
        assert_eq!(queued, Err(CallError::BulkheadFull("pool".into())));
    }

    #[tokio::test]
    async fn test_panicking_call_becomes_failure() {
        let bulkhead = pool(1, 0, 0);

        let outcome: CallOutcome<()> = bulkhead
            .execute(|| async {
                if true {
                    panic!("worker blew up");
                }
                Ok::<(), CallError>(())
            })
            .await;

        assert!(matches!(outcome, Err(CallError::RemoteFailure(_))));
        assert_eq!(bulkhead.available_workers(), 1);
    }

    #[tokio::test]
    async fn test_oversized_pool_is_clamped() {
        let bulkhead = pool(usize::MAX, usize::MAX, 10);
        assert_eq!(bulkhead.available_workers(), Semaphore::MAX_PERMITS);

        let outcome = bulkhead.execute(|| async { Ok::<_, CallError>(1) }).await;
        assert_eq!(outcome.unwrap(), 1);
    }
}
