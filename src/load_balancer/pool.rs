//! Service instance pool.
//!
//! # Responsibilities
//! - Hold the configured instances of one remote service
//! - Apply the configured load balancing strategy
//! - Skip unhealthy instances while a healthy one exists

use std::sync::Arc;

use crate::config::{LoadBalancingStrategy, ServiceConfig};
use crate::load_balancer::{
    instance::ServiceInstance, random::Random, round_robin::RoundRobin, LoadBalancer,
};
use crate::observability::metrics;

/// The instances of one named service plus the strategy choosing among them.
#[derive(Debug)]
pub struct ServicePool {
    name: String,
    instances: Vec<Arc<ServiceInstance>>,
    balancer: Box<dyn LoadBalancer>,
    unhealthy_threshold: usize,
    healthy_threshold: usize,
}

impl ServicePool {
    pub fn from_config(config: &ServiceConfig) -> Self {
        let mut instances = Vec::with_capacity(config.instances.len());
        for address in &config.instances {
            let instance = address
                .parse()
                .ok()
                .and_then(|addr| ServiceInstance::new(addr).ok());
            match instance {
                Some(instance) => instances.push(Arc::new(instance)),
                None => tracing::warn!(service = %config.name, address = %address, "Invalid instance address"),
            }
        }

        let balancer: Box<dyn LoadBalancer> = match config.strategy {
            LoadBalancingStrategy::RoundRobin => Box::new(RoundRobin::new()),
            LoadBalancingStrategy::Random => Box::new(Random::new()),
        };

        Self {
            name: config.name.clone(),
            instances,
            balancer,
            unhealthy_threshold: config.unhealthy_threshold as usize,
            healthy_threshold: config.healthy_threshold as usize,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instances(&self) -> &[Arc<ServiceInstance>] {
        &self.instances
    }

    /// Pick the instance for the next call. With every instance unhealthy the
    /// whole list is used.
    pub fn resolve(&self) -> Option<Arc<ServiceInstance>> {
        let healthy: Vec<_> = self
            .instances
            .iter()
            .filter(|i| i.is_healthy())
            .cloned()
            .collect();

        if healthy.is_empty() {
            tracing::debug!(service = %self.name, instance_count = self.instances.len(), "No healthy instances, trying all");
            self.balancer.next_instance(&self.instances)
        } else {
            self.balancer.next_instance(&healthy)
        }
    }

    pub fn report_success(&self, instance: &ServiceInstance) {
        if instance.mark_success(self.healthy_threshold) {
            tracing::info!(service = %self.name, instance = %instance.addr, "Instance healthy");
            metrics::record_instance_health(&self.name, &instance.addr.to_string(), true);
        }
    }

    pub fn report_failure(&self, instance: &ServiceInstance) {
        if instance.mark_failure(self.unhealthy_threshold) {
            tracing::warn!(service = %self.name, instance = %instance.addr, "Instance unhealthy");
            metrics::record_instance_health(&self.name, &instance.addr.to_string(), false);
        }
    }
}
