//! Call outcome taxonomy.

use std::fmt;
use std::time::Duration;

/// Result of one guarded call: a payload or the reason it was not produced.
pub type CallOutcome<T = String> = Result<T, CallError>;

/// Why a guarded call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// The downstream call itself failed.
    #[error("remote call failed: {0}")]
    RemoteFailure(String),

    /// The call did not finish within its deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// Rejected by a rate limiter.
    #[error("rate limiter '{0}' does not permit further calls")]
    RateLimitExceeded(String),

    /// Rejected by a bulkhead (semaphore or thread pool).
    #[error("bulkhead '{0}' is full and does not permit further calls")]
    BulkheadFull(String),

    /// Rejected by an open circuit breaker.
    #[error("circuit breaker '{0}' is open and does not permit further calls")]
    CircuitOpen(String),

    /// A retry gave up; `last` is the failure of the final attempt.
    #[error("retry '{name}' exhausted after {attempts} attempts: {last}")]
    RetryExhausted {
        name: String,
        attempts: u32,
        last: Box<CallError>,
    },
}

/// Flat classification of [`CallError`], used for labels and branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    RemoteFailure,
    Timeout,
    RateLimitExceeded,
    BulkheadFull,
    CircuitOpen,
    RetryExhausted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::RemoteFailure => "remote_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::BulkheadFull => "bulkhead_full",
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::RetryExhausted => "retry_exhausted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CallError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CallError::RemoteFailure(_) => ErrorKind::RemoteFailure,
            CallError::Timeout(_) => ErrorKind::Timeout,
            CallError::RateLimitExceeded(_) => ErrorKind::RateLimitExceeded,
            CallError::BulkheadFull(_) => ErrorKind::BulkheadFull,
            CallError::CircuitOpen(_) => ErrorKind::CircuitOpen,
            CallError::RetryExhausted { .. } => ErrorKind::RetryExhausted,
        }
    }

    /// True when a policy refused the call without running it.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::RateLimitExceeded | ErrorKind::BulkheadFull | ErrorKind::CircuitOpen
        )
    }

    /// Only failures of an actual invocation are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::RemoteFailure | ErrorKind::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        let remote = CallError::RemoteFailure("boom".into());
        assert!(remote.is_retryable());
        assert!(!remote.is_rejection());

        let open = CallError::CircuitOpen("cb".into());
        assert!(open.is_rejection());
        assert!(!open.is_retryable());

        let exhausted = CallError::RetryExhausted {
            name: "r".into(),
            attempts: 3,
            last: Box::new(CallError::Timeout(Duration::from_millis(5))),
        };
        assert_eq!(exhausted.kind(), ErrorKind::RetryExhausted);
        assert!(!exhausted.is_retryable());
        assert!(exhausted.to_string().contains("after 3 attempts"));
    }
}
