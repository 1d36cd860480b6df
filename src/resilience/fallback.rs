//! Fallback handlers.
//!
//! A fallback turns any [`CallError`] into a degraded but valid payload. It
//! must not fail: whatever went wrong upstream, the caller gets a string.

use crate::resilience::error::CallError;

pub trait FallbackHandler: Send + Sync {
    fn on_rejected_or_failed(&self, cause: &CallError) -> String;
}

impl<F> FallbackHandler for F
where
    F: Fn(&CallError) -> String + Send + Sync,
{
    fn on_rejected_or_failed(&self, cause: &CallError) -> String {
        self(cause)
    }
}

/// Answers every failure with the same payload and logs the cause.
#[derive(Debug, Clone)]
pub struct FixedFallback {
    payload: String,
}

impl FixedFallback {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl Default for FixedFallback {
    fn default() -> Self {
        Self::new("ok fallback")
    }
}

impl FallbackHandler for FixedFallback {
    fn on_rejected_or_failed(&self, cause: &CallError) -> String {
        tracing::error!(error = %cause, kind = %cause.kind(), "Fallback happened");
        self.payload.clone()
    }
}
