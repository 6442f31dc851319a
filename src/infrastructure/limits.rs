//! Limits sourced from configuration, equal for every world

use async_trait::async_trait;

use crate::application::ports::outbound::{LimitsError, LimitsPort};

#[derive(Debug, Clone)]
pub struct ConfiguredLimits {
    pub max_parcels: usize,
    pub max_size_mb: u64,
    pub allow_sdk6: bool,
}

#[async_trait]
impl LimitsPort for ConfiguredLimits {
    async fn max_allowed_parcels_for(&self, _world_name: &str) -> Result<usize, LimitsError> {
        Ok(self.max_parcels)
    }

    async fn max_allowed_size_in_mb_for(&self, _world_name: &str) -> Result<u64, LimitsError> {
        Ok(self.max_size_mb)
    }

    async fn allow_sdk6_for(&self, _world_name: &str) -> Result<bool, LimitsError> {
        Ok(self.allow_sdk6)
    }
}
