//! Limits port - externally sourced per-world policy values

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum LimitsError {
    #[error("Failed to resolve limits: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LimitsPort: Send + Sync {
    async fn max_allowed_parcels_for(&self, world_name: &str) -> Result<usize, LimitsError>;

    async fn max_allowed_size_in_mb_for(&self, world_name: &str) -> Result<u64, LimitsError>;

    async fn allow_sdk6_for(&self, world_name: &str) -> Result<bool, LimitsError>;
}
