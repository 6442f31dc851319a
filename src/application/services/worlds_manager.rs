//! World metadata store
//!
//! Every read goes through the deny list first: a banned world is reported as
//! absent, exactly like a world that was never created.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use super::name_deny_list::NameDenyList;
use crate::application::ports::outbound::{
    ContentStoragePort, DenyListError, NameOwnershipError, NameOwnershipPort, RepositoryError,
    StorageError, WorldsRepositoryPort,
};
use crate::domain::entities::{Entity, SceneDeployment, WorldMetadata};
use crate::domain::services::{
    extract_world_runtime_metadata, PermissionChecker, PermissionConfigError,
};
use crate::domain::value_objects::{AuthChain, Permissions};

#[derive(Debug, thiserror::Error)]
pub enum WorldsError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    DenyList(#[from] DenyListError),
    #[error(transparent)]
    NameOwnership(#[from] NameOwnershipError),
    #[error(transparent)]
    PermissionConfig(#[from] PermissionConfigError),
    #[error("Auth chain for entity {0} is missing or invalid")]
    MissingAuthChain(String),
}

pub struct WorldsManager {
    repository: Arc<dyn WorldsRepositoryPort>,
    storage: Arc<dyn ContentStoragePort>,
    deny_list: Arc<NameDenyList>,
    ownership: Arc<dyn NameOwnershipPort>,
}

impl WorldsManager {
    pub fn new(
        repository: Arc<dyn WorldsRepositoryPort>,
        storage: Arc<dyn ContentStoragePort>,
        deny_list: Arc<NameDenyList>,
        ownership: Arc<dyn NameOwnershipPort>,
    ) -> Self {
        Self {
            repository,
            storage,
            deny_list,
            ownership,
        }
    }

    pub async fn get_metadata_for_world(
        &self,
        world_name: &str,
    ) -> Result<Option<WorldMetadata>, WorldsError> {
        if !self.deny_list.is_allowed(world_name).await? {
            warn!(world = %world_name, "Attempt to access world which is banned");
            return Ok(None);
        }
        Ok(self.repository.get(world_name).await?)
    }

    pub async fn get_entity_for_world(&self, world_name: &str) -> Result<Option<Entity>, WorldsError> {
        if !self.deny_list.is_allowed(world_name).await? {
            warn!(world = %world_name, "Attempt to access entity for world which is banned");
            return Ok(None);
        }
        Ok(self.repository.get_deployed_entity(world_name).await?)
    }

    /// Record `entity` as the scene of `world_name`. Content and the
    /// `<id>.auth` record must already be in storage.
    #[instrument(skip(self, entity), fields(entity_id = %entity.id))]
    pub async fn deploy_scene(&self, world_name: &str, entity: &Entity) -> Result<(), WorldsError> {
        let auth_key = format!("{}.auth", entity.id);
        let raw_auth_chain = self
            .storage
            .retrieve(&auth_key)
            .await?
            .ok_or_else(|| WorldsError::MissingAuthChain(entity.id.clone()))?;
        let auth_chain: AuthChain = serde_json::from_slice(&raw_auth_chain)
            .map_err(|_| WorldsError::MissingAuthChain(entity.id.clone()))?;
        let deployer = auth_chain
            .signer()
            .map(str::to_lowercase)
            .ok_or_else(|| WorldsError::MissingAuthChain(entity.id.clone()))?;

        let owner = self
            .ownership
            .find_owner(world_name)
            .await?
            .map(|owner| owner.to_string());

        let hashes: Vec<String> = entity.content.iter().map(|c| c.hash.clone()).collect();
        let sizes = self.storage.file_info_multiple(&hashes).await?;
        let size = entity
            .content
            .iter()
            .map(|c| sizes.get(&c.hash).copied().flatten().unwrap_or(0))
            .sum();

        let deployment = SceneDeployment {
            name: world_name.to_lowercase(),
            entity: entity.clone(),
            deployer,
            deployment_auth_chain: auth_chain,
            runtime_metadata: extract_world_runtime_metadata(world_name, entity),
            owner,
            size,
            deployed_at: Utc::now(),
        };
        self.repository.upsert_scene(&deployment).await?;

        info!(world = %world_name, size, "Scene deployed to world");
        Ok(())
    }

    #[instrument(skip(self, permissions))]
    pub async fn store_permissions(
        &self,
        world_name: &str,
        permissions: &Permissions,
    ) -> Result<(), WorldsError> {
        self.repository
            .upsert_permissions(world_name, permissions)
            .await?;
        Ok(())
    }

    /// Entities of every deployed, non-banned world, ordered by world name
    pub async fn get_deployed_world_entities(&self) -> Result<Vec<Entity>, WorldsError> {
        let mut entities = Vec::new();
        for world in self.repository.list_deployed().await? {
            if self.deny_list.is_allowed(&world.name).await? {
                entities.push(world.entity);
            }
        }
        Ok(entities)
    }

    pub async fn get_deployed_world_count(&self) -> Result<usize, WorldsError> {
        let mut count = 0;
        for name in self.repository.list_deployed_names().await? {
            if self.deny_list.is_allowed(&name).await? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Checker for the world's stored permissions, or the defaults when the
    /// world has none (or is banned)
    pub async fn permission_checker_for_world(
        &self,
        world_name: &str,
    ) -> Result<PermissionChecker, WorldsError> {
        let permissions = self
            .get_metadata_for_world(world_name)
            .await?
            .map(|metadata| metadata.permissions_or_default())
            .unwrap_or_default();
        Ok(PermissionChecker::new(&permissions)?)
    }
}
