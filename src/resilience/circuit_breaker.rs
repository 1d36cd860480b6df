//! Circuit breaker for remote call protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: one trial call tests whether it recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure rate >= threshold over the trailing window
//!                (evaluated once minimum_number_of_calls are recorded)
//! Open → Half-Open: after wait_duration_in_open_state, on the next call
//! Half-Open → Closed: trial call succeeds
//! Half-Open → Open: trial call fails
//! ```
//!
//! The window is count-based: the last `sliding_window_size` outcomes. All
//! state sits behind one mutex that is never held across an `.await`.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;
use crate::resilience::error::{CallError, CallOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    opened_at: Option<Instant>,
    trial_in_flight: bool,
    /// `true` = failure.
    window: VecDeque<bool>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    wait_in_open: Duration,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            wait_in_open: Duration::from_millis(config.wait_duration_in_open_state_ms),
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                opened_at: None,
                trial_in_flight: false,
                window: VecDeque::new(),
            }),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. An Open circuit whose cool-down has elapsed reads as Half-Open.
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.refresh(&mut inner);
        inner.state
    }

    /// Failure percentage of the window, once enough calls are recorded.
    pub fn failure_rate(&self) -> Option<f32> {
        let inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.rate_of(&inner.window)
    }

    pub async fn execute<T, F, Fut>(&self, call: F) -> CallOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CallOutcome<T>>,
    {
        let mut permit = self.acquire_permission()?;
        let outcome = call().await;
        permit.complete(outcome.is_ok());
        outcome
    }

    fn acquire_permission(&self) -> Result<CallPermit<'_>, CallError> {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        self.refresh(&mut inner);

        let state = inner.state;
        match state {
            CircuitState::Closed => {}
            CircuitState::HalfOpen if !inner.trial_in_flight => {
                inner.trial_in_flight = true;
                tracing::info!(circuit_breaker = %self.name, "Circuit breaker allowing trial call");
            }
            CircuitState::HalfOpen | CircuitState::Open => {
                tracing::debug!(circuit_breaker = %self.name, state = state.as_str(), "Circuit breaker rejecting call");
                return Err(CallError::CircuitOpen(self.name.clone()));
            }
        }

        Ok(CallPermit {
            breaker: self,
            completed: false,
        })
    }

    fn refresh(&self, inner: &mut Inner) {
        if inner.state != CircuitState::Open {
            return;
        }
        let cooled_down = inner
            .opened_at
            .map(|at| at.elapsed() >= self.wait_in_open)
            .unwrap_or(true);
        if cooled_down {
            self.transition(inner, CircuitState::HalfOpen);
        }
    }

    fn record(&self, success: bool) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");

        let state = inner.state;
        match state {
            CircuitState::Closed => {
                if inner.window.len() == self.config.sliding_window_size {
                    inner.window.pop_front();
                }
                inner.window.push_back(!success);

                if let Some(rate) = self.rate_of(&inner.window) {
                    if rate >= self.config.failure_rate_threshold {
                        tracing::warn!(
                            circuit_breaker = %self.name,
                            failure_rate = rate,
                            threshold = self.config.failure_rate_threshold,
                            "Circuit breaker opened"
                        );
                        self.transition(&mut inner, CircuitState::Open);
                    }
                }
            }
            CircuitState::HalfOpen => {
                if success {
                    tracing::info!(circuit_breaker = %self.name, "Circuit breaker closed after successful trial");
                    self.transition(&mut inner, CircuitState::Closed);
                } else {
                    tracing::warn!(circuit_breaker = %self.name, "Circuit breaker reopened after failed trial");
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            // Late result of a call admitted before the circuit opened.
            CircuitState::Open => {}
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        inner.state = to;
        inner.trial_in_flight = false;
        match to {
            CircuitState::Open => inner.opened_at = Some(Instant::now()),
            CircuitState::Closed => {
                inner.opened_at = None;
                inner.window.clear();
            }
            CircuitState::HalfOpen => {}
        }
        metrics::record_circuit_transition(&self.name, to);
    }

    fn rate_of(&self, window: &VecDeque<bool>) -> Option<f32> {
        let minimum = self
            .config
            .minimum_number_of_calls
            .min(self.config.sliding_window_size)
            .max(1);
        if window.len() < minimum {
            return None;
        }
        let failures = window.iter().filter(|failed| **failed).count();
        Some(failures as f32 * 100.0 / window.len() as f32)
    }
}

/// Permission to run one call. Dropping it unfinished (the caller was
/// cancelled) counts as a failure, so a Half-Open trial is never leaked.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    completed: bool,
}

impl CallPermit<'_> {
    fn complete(&mut self, success: bool) {
        self.completed = true;
        self.breaker.record(success);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.breaker.record(false);
        }
    }
}
