//! Timeout enforcement.
//!
//! A call that misses its deadline is dropped (cancelled) and reported as
//! [`CallError::Timeout`], distinct from other remote failures.

use std::future::Future;
use std::time::Duration;

use crate::resilience::error::{CallError, CallOutcome};

/// Run `call`, turning an elapsed deadline into `CallError::Timeout`.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> CallOutcome<T>
where
    F: Future<Output = CallOutcome<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(outcome) => outcome,
        Err(_) => Err(CallError::Timeout(limit)),
    }
}
