//! Random load balancing strategy.

use std::sync::Arc;

use crate::load_balancer::{instance::ServiceInstance, LoadBalancer};

/// Uniformly random selector.
#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for Random {
    fn next_instance(&self, instances: &[Arc<ServiceInstance>]) -> Option<Arc<ServiceInstance>> {
        if instances.is_empty() {
            return None;
        }
        Some(instances[fastrand::usize(..instances.len())].clone())
    }
}
