//! Service instance abstraction.
//!
//! # Responsibilities
//! - Represent one address of a remote service
//! - Track passive health from call outcomes (Healthy/Unhealthy)

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use url::Url;

/// Health State enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

/// One instance of a remote service.
#[derive(Debug)]
pub struct ServiceInstance {
    pub addr: SocketAddr,
    /// `http://{addr}/`, joined with operation paths.
    pub base_url: Url,

    /// Current health state (0=Unknown, 1=Healthy, 2=Unhealthy).
    state: AtomicU8,
    consecutive_failures: AtomicUsize,
    consecutive_successes: AtomicUsize,
}

impl ServiceInstance {
    pub fn new(addr: SocketAddr) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(&format!("http://{}/", addr))?;
        Ok(Self {
            addr,
            base_url,
            state: AtomicU8::new(HealthState::Unknown as u8),
            consecutive_failures: AtomicUsize::new(0),
            consecutive_successes: AtomicUsize::new(0),
        })
    }

    pub fn health(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Healthy or not yet known.
    pub fn is_healthy(&self) -> bool {
        self.health() != HealthState::Unhealthy
    }

    /// Report a call that reached the instance. Returns true on a transition
    /// to Healthy.
    pub fn mark_success(&self, healthy_threshold: usize) -> bool {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.health() == HealthState::Healthy {
            return false;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            self.consecutive_successes.store(0, Ordering::Relaxed);
            return true;
        }
        false
    }

    /// Report a call that could not reach the instance. Returns true on a
    /// transition to Unhealthy.
    pub fn mark_failure(&self, unhealthy_threshold: usize) -> bool {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.health() == HealthState::Unhealthy {
            return false;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            self.consecutive_failures.store(0, Ordering::Relaxed);
            return true;
        }
        false
    }
}
