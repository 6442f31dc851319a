//! Deployment use case: validate, then persist, one world at a time
//!
//! The permission check and the write of the world record happen under a
//! per-world lock, so a deployment cannot land on a world whose permissions
//! were evaluated for a different state. The lock is process-local.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::entity_deployer::{DeployerError, EntityDeployer};
use super::validation::{ValidationError, Validator};
use crate::application::dto::{
    DeploymentRequest, DeploymentResult, DeploymentToValidate, ValidationResult,
};
use crate::application::ports::outbound::{ContentStoragePort, StorageError};
use crate::domain::entities::Entity;

#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Deployer(#[from] DeployerError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    Deployed(DeploymentResult),
    Rejected(ValidationResult),
}

pub struct DeploymentService {
    storage: Arc<dyn ContentStoragePort>,
    validator: Arc<Validator>,
    deployer: Arc<EntityDeployer>,
    world_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DeploymentService {
    pub fn new(
        storage: Arc<dyn ContentStoragePort>,
        validator: Arc<Validator>,
        deployer: Arc<EntityDeployer>,
    ) -> Self {
        Self {
            storage,
            validator,
            deployer,
            world_locks: Mutex::new(HashMap::new()),
        }
    }

    #[instrument(skip_all, fields(entity_id = %request.entity_id))]
    pub async fn deploy(&self, request: DeploymentRequest) -> Result<DeploymentOutcome, DeploymentError> {
        let Some(raw) = request.files.get(&request.entity_id) else {
            return Ok(DeploymentOutcome::Rejected(ValidationResult::error(
                "Entity not found in files.",
            )));
        };
        let entity = match Entity::from_json(request.entity_id.clone(), raw) {
            Ok(entity) => entity,
            Err(e) => {
                warn!(error = %e, "Entity file is not a valid entity");
                return Ok(DeploymentOutcome::Rejected(ValidationResult::error(format!(
                    "Invalid entity: {e}"
                ))));
            }
        };

        let lock_key = entity
            .world_name()
            .map(str::to_lowercase)
            .unwrap_or_else(|| entity.id.clone());
        let lock = self.world_lock(&lock_key).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.validate_and_deploy(entity, request).await
        };
        self.release_world_lock(&lock_key, lock).await;

        outcome
    }

    async fn validate_and_deploy(
        &self,
        entity: Entity,
        request: DeploymentRequest,
    ) -> Result<DeploymentOutcome, DeploymentError> {
        let hashes: Vec<String> = entity
            .content
            .iter()
            .map(|c| c.hash.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let content_hashes_in_storage = self.storage.exist_multiple(&hashes).await?;

        let deployment = DeploymentToValidate {
            entity,
            files: request.files,
            auth_chain: request.auth_chain,
            content_hashes_in_storage,
        };

        let result = self.validator.validate(&deployment).await?;
        if !result.ok() {
            info!(errors = ?result.errors, "Deployment rejected");
            return Ok(DeploymentOutcome::Rejected(result));
        }

        let entity_raw = deployment.entity_raw().unwrap_or_default();
        let deployed = self
            .deployer
            .deploy_entity(
                &request.base_url,
                &deployment.entity,
                &deployment.content_hashes_in_storage,
                &deployment.files,
                entity_raw,
                &deployment.auth_chain,
            )
            .await?;

        Ok(DeploymentOutcome::Deployed(deployed))
    }

    async fn world_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.world_locks.lock().await;
        locks.entry(key.to_string()).or_default().clone()
    }

    async fn release_world_lock(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.world_locks.lock().await;
        // the map and `lock` are the only holders: nobody is waiting
        if Arc::strong_count(&lock) == 2 {
            locks.remove(key);
        }
    }

    #[cfg(test)]
    async fn held_locks(&self) -> usize {
        self.world_locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::validation::ValidatorConfig;
    use crate::application::services::{
        DeploymentMetrics, NameDenyList, NamePermissionChecker, PermissionsService, WorldsManager,
    };
    use crate::domain::value_objects::PermissionKind;
    use crate::infrastructure::storage::InMemoryContentStorage;
    use crate::test_support::{
        scene_deployment, FixedOwnership, Identity, InMemoryWorldsRepository, StaticLimits,
    };

    struct Fixture {
        service: Arc<DeploymentService>,
        permissions: PermissionsService,
        worlds: Arc<WorldsManager>,
        storage: Arc<InMemoryContentStorage>,
    }

    fn fixture(owner: &Identity) -> Fixture {
        let storage = Arc::new(InMemoryContentStorage::default());
        let ownership = Arc::new(FixedOwnership::owned_by(&owner.address()));
        let deny_list = Arc::new(NameDenyList::disabled());
        let worlds = Arc::new(WorldsManager::new(
            Arc::new(InMemoryWorldsRepository::default()),
            storage.clone(),
            deny_list.clone(),
            ownership.clone(),
        ));
        let name_checker = Arc::new(NamePermissionChecker::new(ownership));
        let validator = Arc::new(Validator::new(
            ValidatorConfig::default(),
            worlds.clone(),
            name_checker.clone(),
            deny_list,
            Arc::new(StaticLimits::default()),
            storage.clone(),
        ));
        let deployer = Arc::new(EntityDeployer::new(
            storage.clone(),
            worlds.clone(),
            Arc::new(DeploymentMetrics::new()),
            None,
        ));
        Fixture {
            service: Arc::new(DeploymentService::new(storage.clone(), validator, deployer)),
            permissions: PermissionsService::new(worlds.clone(), name_checker),
            worlds,
            storage,
        }
    }

    fn request(deployment: DeploymentToValidate) -> DeploymentRequest {
        DeploymentRequest {
            entity_id: deployment.entity.id,
            auth_chain: deployment.auth_chain,
            files: deployment.files,
            base_url: "https://worlds.example".to_string(),
        }
    }

    const FILES: &[(&str, &[u8])] = &[("bin/index.js", b"main()".as_slice())];

    #[tokio::test]
    async fn test_non_owner_deployment_is_rejected() {
        let owner = Identity::random();
        let f = fixture(&owner);
        let intruder = Identity::random();

        let outcome = f
            .service
            .deploy(request(scene_deployment(&intruder, "alice.dcl.eth", FILES)))
            .await
            .unwrap();

        let DeploymentOutcome::Rejected(result) = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert!(result.errors[0].contains("no permission to publish"));
        assert!(f.worlds.get_metadata_for_world("alice.dcl.eth").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tampered_entity_id_persists_nothing() {
        let owner = Identity::random();
        let f = fixture(&owner);
        let mut deployment = scene_deployment(&owner, "alice.dcl.eth", FILES);
        let raw = deployment.files.remove(&deployment.entity.id).unwrap();
        let mut tampered = raw.clone();
        tampered.extend_from_slice(b" ");
        deployment.files.insert(deployment.entity.id.clone(), tampered);

        let outcome = f.service.deploy(request(deployment)).await.unwrap();

        let DeploymentOutcome::Rejected(result) = outcome else {
            panic!("expected rejection, got {outcome:?}");
        };
        assert!(result.errors[0].starts_with("Invalid entity hash"));
        assert_eq!(f.storage.len(), 0);
    }

    #[tokio::test]
    async fn test_allow_listed_wallet_deploys_and_store_reflects_it() {
        let owner = Identity::random();
        let f = fixture(&owner);
        let delegate = Identity::random();
        f.permissions
            .store_permissions("alice.dcl.eth", &Default::default())
            .await
            .unwrap();
        f.permissions
            .add_address_to_allow_list(
                &owner.address(),
                "alice.dcl.eth",
                PermissionKind::Deployment,
                &delegate.address(),
            )
            .await
            .unwrap();
        let deployment = scene_deployment(&delegate, "alice.dcl.eth", FILES);
        let entity_id = deployment.entity.id.clone();

        let outcome = f.service.deploy(request(deployment)).await.unwrap();

        assert!(matches!(outcome, DeploymentOutcome::Deployed(_)), "{outcome:?}");
        let metadata = f
            .worlds
            .get_metadata_for_world("alice.dcl.eth")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metadata.entity_id, Some(entity_id));
        assert_eq!(f.service.held_locks().await, 0);
    }

    #[tokio::test]
    async fn test_redeploying_same_content_stores_one_copy() {
        let owner = Identity::random();
        let f = fixture(&owner);
        let first = scene_deployment(&owner, "alice.dcl.eth", FILES);
        let main_hash = first.entity.hash_for_file("bin/index.js").unwrap().to_string();
        let second = scene_deployment(&owner, "alice.dcl.eth", FILES);

        f.service.deploy(request(first)).await.unwrap();
        f.service.deploy(request(second)).await.unwrap();

        assert_eq!(f.storage.write_count(&main_hash), 1);
    }

    #[tokio::test]
    async fn test_concurrent_deployments_to_one_world_are_serialized() {
        let owner = Identity::random();
        let f = fixture(&owner);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let service = f.service.clone();
                let deployment = scene_deployment(&owner, "alice.dcl.eth", FILES);
                tokio::spawn(async move { service.deploy(request(deployment)).await })
            })
            .collect();
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            assert!(matches!(outcome, DeploymentOutcome::Deployed(_)));
        }

        assert_eq!(f.service.held_locks().await, 0);
    }

    #[tokio::test]
    async fn test_malformed_entity_is_rejected() {
        let owner = Identity::random();
        let f = fixture(&owner);
        let entity_id = crate::domain::value_objects::content_hash::hash_v1(b"not json");

        let outcome = f
            .service
            .deploy(DeploymentRequest {
                entity_id: entity_id.clone(),
                auth_chain: Default::default(),
                files: HashMap::from([(entity_id, b"not json".to_vec())]),
                base_url: "https://worlds.example".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(outcome, DeploymentOutcome::Rejected(_)));
    }

    #[tokio::test]
    async fn test_unknown_entity_type_reaches_type_check() {
        let owner = Identity::random();
        let f = fixture(&owner);
        let raw = serde_json::to_vec(&serde_json::json!({
            "version": "v3",
            "type": "planet",
            "pointers": ["0,0"],
            "timestamp": chrono::Utc::now().timestamp_millis(),
            "content": [],
        }))
        .unwrap();
        let entity_id = crate::domain::value_objects::content_hash::hash_v1(&raw);

        let outcome = f
            .service
            .deploy(DeploymentRequest {
                auth_chain: owner.sign_entity(&entity_id),
                files: HashMap::from([(entity_id.clone(), raw)]),
                entity_id,
                base_url: "https://worlds.example".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DeploymentOutcome::Rejected(ValidationResult::error(
                "Entity type planet is not supported."
            ))
        );
    }
}
