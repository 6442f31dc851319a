use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Process-wide deployment counters
#[derive(Debug, Default)]
pub struct DeploymentMetrics {
    world_deployments: AtomicU64,
}

impl DeploymentMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_world_deployments(&self) -> u64 {
        let total = self.world_deployments.fetch_add(1, Ordering::Relaxed) + 1;
        info!(world_deployments_counter = total, "Recorded world deployment");
        total
    }

    pub fn world_deployments(&self) -> u64 {
        self.world_deployments.load(Ordering::Relaxed)
    }
}
