//! Entity deployer - persists an accepted deployment
//!
//! Content first, then the entity and its auth chain, then the hook for the
//! entity type. The world record is written last, by the scene hook.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, error, info, instrument};

use super::metrics::DeploymentMetrics;
use super::worlds_manager::{WorldsError, WorldsManager};
use crate::application::dto::{DeploymentNotification, DeploymentResult, NotifiedEntity};
use crate::application::ports::outbound::{
    ContentStoragePort, DeploymentNotifierPort, StorageError,
};
use crate::domain::entities::{Entity, EntityType};
use crate::domain::value_objects::AuthChain;

const PLAY_URL: &str = "https://play.decentraland.org/";

#[derive(Debug, thiserror::Error)]
pub enum DeployerError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Worlds(#[from] WorldsError),
    #[error("Failed to serialize auth chain: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Uploaded file {0} disappeared before it could be stored")]
    MissingUpload(String),
    #[error("Invalid world url: {0}")]
    InvalidUrl(String),
}

pub struct EntityDeployer {
    storage: Arc<dyn ContentStoragePort>,
    worlds: Arc<WorldsManager>,
    metrics: Arc<DeploymentMetrics>,
    notifier: Option<Arc<dyn DeploymentNotifierPort>>,
}

impl EntityDeployer {
    pub fn new(
        storage: Arc<dyn ContentStoragePort>,
        worlds: Arc<WorldsManager>,
        metrics: Arc<DeploymentMetrics>,
        notifier: Option<Arc<dyn DeploymentNotifierPort>>,
    ) -> Self {
        Self {
            storage,
            worlds,
            metrics,
            notifier,
        }
    }

    #[instrument(skip_all, fields(entity_id = %entity.id))]
    pub async fn deploy_entity(
        &self,
        base_url: &str,
        entity: &Entity,
        hashes_in_storage: &HashMap<String, bool>,
        files: &HashMap<String, Vec<u8>>,
        entity_raw: &[u8],
        auth_chain: &AuthChain,
    ) -> Result<DeploymentResult, DeployerError> {
        let mut stored: HashMap<&str, bool> = hashes_in_storage
            .iter()
            .map(|(hash, present)| (hash.as_str(), *present))
            .collect();

        for mapping in &entity.content {
            if stored.get(mapping.hash.as_str()).copied().unwrap_or(false) {
                continue;
            }
            let bytes = files
                .get(&mapping.hash)
                .ok_or_else(|| DeployerError::MissingUpload(mapping.hash.clone()))?;
            info!(cid = %mapping.hash, filename = %mapping.file, "Storing file");
            self.storage.store(&mapping.hash, bytes).await?;
            stored.insert(mapping.hash.as_str(), true);
        }

        info!(cid = %entity.id, "Storing entity");
        self.storage.store(&entity.id, entity_raw).await?;
        self.storage
            .store(&format!("{}.auth", entity.id), &serde_json::to_vec(auth_chain)?)
            .await?;

        self.post_deployment(base_url, entity, auth_chain).await
    }

    async fn post_deployment(
        &self,
        base_url: &str,
        entity: &Entity,
        auth_chain: &AuthChain,
    ) -> Result<DeploymentResult, DeployerError> {
        match &entity.entity_type {
            EntityType::Scene => self.post_scene_deployment(base_url, entity, auth_chain).await,
            EntityType::Profile
            | EntityType::Wearable
            | EntityType::Store
            | EntityType::Emote
            | EntityType::Outfits
            | EntityType::Unknown(_) => Ok(DeploymentResult {
                message: "No post deployment hook for this entity type".to_string(),
            }),
        }
    }

    async fn post_scene_deployment(
        &self,
        base_url: &str,
        entity: &Entity,
        auth_chain: &AuthChain,
    ) -> Result<DeploymentResult, DeployerError> {
        let world_name = entity.world_name().unwrap_or_default();
        debug!(entity_id = %entity.id, world = %world_name, "Deploying scene under world name");

        self.worlds.deploy_scene(world_name, entity).await?;
        self.metrics.increment_world_deployments();

        if let Some(notifier) = &self.notifier {
            let notification = DeploymentNotification {
                entity: NotifiedEntity {
                    entity_id: entity.id.clone(),
                    auth_chain: auth_chain.clone(),
                },
                content_server_urls: vec![base_url.to_string()],
            };
            // the world record is already written
            match notifier.publish(&notification).await {
                Ok(()) => info!(entity_id = %entity.id, "Deployment notification sent"),
                Err(e) => error!(entity_id = %entity.id, error = %e, "Deployment notification failed"),
            }
        }

        let world_url = format!("{}/world/{}", base_url.trim_end_matches('/'), world_name);
        let play_url = Url::parse_with_params(PLAY_URL, &[("realm", world_url.as_str())])
            .map_err(|e| DeployerError::InvalidUrl(e.to_string()))?;

        Ok(DeploymentResult {
            message: format!(
                "Your scene was deployed to a Worlds Content Server!\nAccess world {world_name}: {play_url}"
            ),
        })
    }
}
