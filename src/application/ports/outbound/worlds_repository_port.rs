//! Worlds repository port - persistence of world metadata

use async_trait::async_trait;

use crate::domain::entities::{DeployedWorld, Entity, SceneDeployment, WorldMetadata};
use crate::domain::value_objects::Permissions;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Rows are keyed by the case-folded world name. Writes are single upserts,
/// last write wins.
#[async_trait]
pub trait WorldsRepositoryPort: Send + Sync {
    async fn get(&self, name: &str) -> Result<Option<WorldMetadata>, RepositoryError>;

    async fn get_deployed_entity(&self, name: &str) -> Result<Option<Entity>, RepositoryError>;

    async fn upsert_scene(&self, deployment: &SceneDeployment) -> Result<(), RepositoryError>;

    async fn upsert_permissions(
        &self,
        name: &str,
        permissions: &Permissions,
    ) -> Result<(), RepositoryError>;

    /// All worlds with a deployed entity, ordered by name
    async fn list_deployed(&self) -> Result<Vec<DeployedWorld>, RepositoryError>;

    async fn list_deployed_names(&self) -> Result<Vec<String>, RepositoryError>;
}
