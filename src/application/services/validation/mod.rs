//! Deployment validation
//!
//! Checks run in a fixed order and stop at the first failing step. Common
//! checks run for every entity; scene checks follow for scenes. Steps that
//! call out to storage, the limits source or name ownership come last, so a
//! structurally invalid deployment never costs a remote call.

pub mod common;
pub mod scene;
pub mod signature;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::name_deny_list::NameDenyList;
use super::name_permission_checker::NamePermissionChecker;
use super::worlds_manager::{WorldsError, WorldsManager};
use crate::application::dto::{DeploymentToValidate, ValidationResult};
use crate::application::ports::outbound::{
    ContentStoragePort, DenyListError, LimitsError, LimitsPort, NameOwnershipError, StorageError,
};
use crate::domain::entities::EntityType;
use crate::domain::value_objects::PermissionKind;

/// The deployment could not be evaluated. Retryable, unlike a failed
/// [`ValidationResult`].
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Worlds(#[from] WorldsError),
    #[error(transparent)]
    NameOwnership(#[from] NameOwnershipError),
    #[error(transparent)]
    Limits(#[from] LimitsError),
    #[error(transparent)]
    DenyList(#[from] DenyListError),
}

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub deployment_ttl_ms: i64,
    pub validate_sdk_version: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            deployment_ttl_ms: 300_000,
            validate_sdk_version: false,
        }
    }
}

/// Returns the step's result from the enclosing function unless it passed
macro_rules! check {
    ($step:expr) => {{
        let result: ValidationResult = $step;
        if !result.ok() {
            return Ok(result);
        }
    }};
}

pub struct Validator {
    config: ValidatorConfig,
    worlds: Arc<WorldsManager>,
    name_checker: Arc<NamePermissionChecker>,
    deny_list: Arc<NameDenyList>,
    limits: Arc<dyn LimitsPort>,
    storage: Arc<dyn ContentStoragePort>,
}

impl Validator {
    pub fn new(
        config: ValidatorConfig,
        worlds: Arc<WorldsManager>,
        name_checker: Arc<NamePermissionChecker>,
        deny_list: Arc<NameDenyList>,
        limits: Arc<dyn LimitsPort>,
        storage: Arc<dyn ContentStoragePort>,
    ) -> Self {
        Self {
            config,
            worlds,
            name_checker,
            deny_list,
            limits,
            storage,
        }
    }

    #[instrument(skip_all, fields(entity_id = %deployment.entity.id))]
    pub async fn validate(
        &self,
        deployment: &DeploymentToValidate,
    ) -> Result<ValidationResult, ValidationError> {
        self.validate_at(deployment, Utc::now()).await
    }

    pub async fn validate_at(
        &self,
        deployment: &DeploymentToValidate,
        now: DateTime<Utc>,
    ) -> Result<ValidationResult, ValidationError> {
        check!(common::validate_entity_id(deployment));
        check!(common::validate_base_entity(deployment));
        check!(common::validate_auth_chain(deployment));
        check!(common::validate_signer(deployment));
        check!(common::validate_signature(deployment, now));
        check!(common::validate_deployment_ttl(
            deployment,
            now,
            self.config.deployment_ttl_ms
        ));
        check!(common::validate_files(deployment));
        check!(common::validate_supported_entity_type(deployment));

        match &deployment.entity.entity_type {
            EntityType::Scene => self.validate_scene(deployment).await,
            EntityType::Profile
            | EntityType::Wearable
            | EntityType::Store
            | EntityType::Emote
            | EntityType::Outfits
            | EntityType::Unknown(_) => Ok(ValidationResult::passed()),
        }
    }

    async fn validate_scene(
        &self,
        deployment: &DeploymentToValidate,
    ) -> Result<ValidationResult, ValidationError> {
        check!(scene::validate_scene_entity(deployment));
        check!(scene::validate_world_configuration(deployment));

        let Some(world_name) = deployment.entity.world_name() else {
            return Ok(ValidationResult::error(scene::MISSING_WORLD_NAME));
        };

        let max_parcels = self.limits.max_allowed_parcels_for(world_name).await?;
        check!(scene::validate_scene_dimensions(deployment, max_parcels));
        check!(scene::validate_mini_map_images(deployment));
        check!(scene::validate_skybox_textures(deployment));
        check!(scene::validate_thumbnail(deployment));

        let allowed = self.deny_list.is_allowed(world_name).await?;
        check!(scene::validate_banned_name(world_name, allowed));

        if self.config.validate_sdk_version {
            let allow_sdk6 = self.limits.allow_sdk6_for(world_name).await?;
            check!(scene::validate_sdk_version(deployment, allow_sdk6));
        }

        let max_size_mb = self.limits.max_allowed_size_in_mb_for(world_name).await?;
        let stored_sizes = self
            .storage
            .file_info_multiple(&scene::hashes_needing_stored_size(deployment))
            .await?;
        check!(scene::validate_size(deployment, &stored_sizes, max_size_mb));

        check!(self.validate_deployment_permission(deployment, world_name).await?);

        Ok(ValidationResult::passed())
    }

    /// The deployment allow-list is consulted first; name ownership may need
    /// a remote lookup.
    async fn validate_deployment_permission(
        &self,
        deployment: &DeploymentToValidate,
        world_name: &str,
    ) -> Result<ValidationResult, ValidationError> {
        let signer = deployment.signer().unwrap_or_default();

        let checker = self.worlds.permission_checker_for_world(world_name).await?;
        if checker.check_permission(PermissionKind::Deployment, signer, None) {
            debug!(world = %world_name, signer = %signer, "Signer is in the deployment allow list");
            return Ok(ValidationResult::passed());
        }

        if self.name_checker.check_permission(signer, world_name).await? {
            return Ok(ValidationResult::passed());
        }

        Ok(scene::deployment_permission_denied(world_name))
    }
}
