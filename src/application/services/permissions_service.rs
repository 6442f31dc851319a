//! Permissions use cases: reading, replacing and editing a world's policies
//!
//! Every mutation requires the caller to own the world name.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use super::name_permission_checker::NamePermissionChecker;
use super::worlds_manager::{WorldsError, WorldsManager};
use crate::application::dto::{AccessControlList, SetPermissionRequest};
use crate::application::ports::outbound::NameOwnershipError;
use crate::domain::value_objects::{
    EthAddress, PermissionKind, PermissionSetting, Permissions, PolicyType, PublicPermissions,
    SecretHash,
};

/// How far an ACL change timestamp may drift from the server clock
const ACL_MAX_SKEW_MS: i64 = 120_000;

#[derive(Debug, thiserror::Error)]
pub enum PermissionsError {
    #[error(transparent)]
    Worlds(#[from] WorldsError),
    #[error(transparent)]
    NameOwnership(#[from] NameOwnershipError),
    #[error("Your wallet does not own \"{0}\", you can not set access control lists for it.")]
    NotOwner(String),
    #[error("Invalid payload received. {0}")]
    InvalidPayload(String),
    #[error("{0}")]
    InvalidAcl(String),
    #[error("Failed to hash secret: {0}")]
    Hashing(String),
    #[error("World {world} does not have any permission type set for '{kind}'.")]
    NotConfigured { world: String, kind: PermissionKind },
    #[error("World {world} is configured as {policy} (not 'allow-list') for permission '{kind}'.")]
    NotAllowList {
        world: String,
        kind: PermissionKind,
        policy: PolicyType,
    },
    #[error("World {world} already has address {address} in the allow list for permission '{kind}'.")]
    AlreadyAllowed {
        world: String,
        kind: PermissionKind,
        address: String,
    },
    #[error("World {world} does not have address {address} in the allow list for permission '{kind}'.")]
    NotInAllowList {
        world: String,
        kind: PermissionKind,
        address: String,
    },
}

impl PermissionsError {
    /// Caller mistakes, as opposed to infrastructure failures
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            PermissionsError::Worlds(_)
                | PermissionsError::NameOwnership(_)
                | PermissionsError::Hashing(_)
        )
    }
}

pub struct PermissionsService {
    worlds: Arc<WorldsManager>,
    name_checker: Arc<NamePermissionChecker>,
}

impl PermissionsService {
    pub fn new(worlds: Arc<WorldsManager>, name_checker: Arc<NamePermissionChecker>) -> Self {
        Self {
            worlds,
            name_checker,
        }
    }

    /// Stored permissions, or the defaults for worlds without any
    pub async fn get_permissions(&self, world_name: &str) -> Result<Permissions, PermissionsError> {
        Ok(self
            .worlds
            .get_metadata_for_world(world_name)
            .await?
            .map(|metadata| metadata.permissions_or_default())
            .unwrap_or_default())
    }

    pub async fn public_permissions(
        &self,
        world_name: &str,
    ) -> Result<PublicPermissions, PermissionsError> {
        Ok(self.get_permissions(world_name).await?.without_secrets())
    }

    pub async fn store_permissions(
        &self,
        world_name: &str,
        permissions: &Permissions,
    ) -> Result<(), PermissionsError> {
        self.worlds.store_permissions(world_name, permissions).await?;
        Ok(())
    }

    async fn ensure_owner(&self, signer: &str, world_name: &str) -> Result<(), PermissionsError> {
        if self.name_checker.check_permission(signer, world_name).await? {
            Ok(())
        } else {
            Err(PermissionsError::NotOwner(world_name.to_string()))
        }
    }

    /// Replace the policy of one kind. Allow lists start out empty.
    #[instrument(skip(self, request))]
    pub async fn set_permission(
        &self,
        signer: &str,
        world_name: &str,
        kind: PermissionKind,
        request: SetPermissionRequest,
    ) -> Result<(), PermissionsError> {
        self.ensure_owner(signer, world_name).await?;

        let setting = build_setting(kind, request).await?;
        let mut permissions = self.get_permissions(world_name).await?;
        permissions.set(kind, setting);
        self.store_permissions(world_name, &permissions).await?;

        info!(world = %world_name, kind = %kind, "Permission updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn add_address_to_allow_list(
        &self,
        signer: &str,
        world_name: &str,
        kind: PermissionKind,
        address: &str,
    ) -> Result<(), PermissionsError> {
        self.ensure_owner(signer, world_name).await?;

        let address = address.to_lowercase();
        let mut permissions = self.configured_permissions(world_name, kind).await?;
        let wallets = allow_list_mut(&mut permissions, world_name, kind)?;
        if wallets.iter().any(|wallet| wallet.eq_ignore_ascii_case(&address)) {
            return Err(PermissionsError::AlreadyAllowed {
                world: world_name.to_string(),
                kind,
                address,
            });
        }
        wallets.push(address);

        self.store_permissions(world_name, &permissions).await
    }

    #[instrument(skip(self))]
    pub async fn delete_address_from_allow_list(
        &self,
        signer: &str,
        world_name: &str,
        kind: PermissionKind,
        address: &str,
    ) -> Result<(), PermissionsError> {
        self.ensure_owner(signer, world_name).await?;

        let address = address.to_lowercase();
        let mut permissions = self.configured_permissions(world_name, kind).await?;
        let wallets = allow_list_mut(&mut permissions, world_name, kind)?;
        let Some(position) = wallets
            .iter()
            .position(|wallet| wallet.eq_ignore_ascii_case(&address))
        else {
            return Err(PermissionsError::NotInAllowList {
                world: world_name.to_string(),
                kind,
                address,
            });
        };
        wallets.remove(position);

        self.store_permissions(world_name, &permissions).await
    }

    /// Deployment allow list in its ACL form
    pub async fn get_acl(&self, world_name: &str) -> Result<AccessControlList, PermissionsError> {
        let allowed = match self.get_permissions(world_name).await?.deployment {
            PermissionSetting::AllowList { wallets } => wallets,
            _ => Vec::new(),
        };
        Ok(AccessControlList {
            resource: world_name.to_string(),
            allowed: Some(allowed),
            timestamp: Some(String::new()),
        })
    }

    /// Replace the deployment allow list with a recently signed ACL. A
    /// streaming allow list follows the deployment one.
    #[instrument(skip(self, acl))]
    pub async fn set_deployment_acl(
        &self,
        signer: &str,
        world_name: &str,
        acl: AccessControlList,
        now: DateTime<Utc>,
    ) -> Result<AccessControlList, PermissionsError> {
        self.ensure_owner(signer, world_name).await?;

        if acl.resource != world_name {
            return Err(PermissionsError::InvalidAcl(format!(
                "Provided acl is for world \"{}\" but you are trying to set acl for world {}.",
                acl.resource, world_name
            )));
        }

        let allowed = acl
            .allowed
            .as_ref()
            .filter(|allowed| allowed.iter().all(|address| EthAddress::is_valid(address)))
            .ok_or_else(|| {
                PermissionsError::InvalidAcl(
                    "Provided acl is invalid. allowed is missing or not an array of addresses."
                        .to_string(),
                )
            })?;
        if allowed.iter().any(|address| address.eq_ignore_ascii_case(signer)) {
            return Err(PermissionsError::InvalidAcl(format!(
                "You are trying to give permission to yourself. You own \"{world_name}\", so you already have permission to deploy scenes, no need to include yourself in the ACL."
            )));
        }

        let timestamp = acl
            .timestamp
            .as_deref()
            .and_then(|timestamp| DateTime::parse_from_rfc3339(timestamp).ok())
            .ok_or_else(|| {
                PermissionsError::InvalidAcl(
                    "Invalid ACL, timestamp is missing or has an invalid date.".to_string(),
                )
            })?;
        if (timestamp.timestamp_millis() - now.timestamp_millis()).abs() > ACL_MAX_SKEW_MS {
            return Err(PermissionsError::InvalidAcl(
                "Timestamp is not recent. Please sign a new ACL change request.".to_string(),
            ));
        }

        let wallets: Vec<String> = allowed.iter().map(|address| address.to_lowercase()).collect();
        let mut permissions = self.get_permissions(world_name).await?;
        if let PermissionSetting::AllowList { wallets: streaming } = &mut permissions.streaming {
            *streaming = wallets.clone();
        }
        permissions.set(PermissionKind::Deployment, PermissionSetting::AllowList { wallets });
        self.store_permissions(world_name, &permissions).await?;

        info!(world = %world_name, allowed = allowed.len(), "Deployment ACL updated");
        Ok(acl)
    }

    /// Explicitly stored permissions; editing lists on defaults is refused
    async fn configured_permissions(
        &self,
        world_name: &str,
        kind: PermissionKind,
    ) -> Result<Permissions, PermissionsError> {
        self.worlds
            .get_metadata_for_world(world_name)
            .await?
            .and_then(|metadata| metadata.permissions)
            .ok_or_else(|| PermissionsError::NotConfigured {
                world: world_name.to_string(),
                kind,
            })
    }
}

fn allow_list_mut<'a>(
    permissions: &'a mut Permissions,
    world_name: &str,
    kind: PermissionKind,
) -> Result<&'a mut Vec<String>, PermissionsError> {
    match permissions.get_mut(kind) {
        PermissionSetting::AllowList { wallets } => Ok(wallets),
        other => Err(PermissionsError::NotAllowList {
            world: world_name.to_string(),
            kind,
            policy: other.policy_type(),
        }),
    }
}

async fn build_setting(
    kind: PermissionKind,
    request: SetPermissionRequest,
) -> Result<PermissionSetting, PermissionsError> {
    let setting = match request {
        SetPermissionRequest::Unrestricted => PermissionSetting::Unrestricted,
        SetPermissionRequest::AllowList => PermissionSetting::allow_list(),
        SetPermissionRequest::SharedSecret { secret } => {
            let secret = secret.filter(|secret| !secret.is_empty()).ok_or_else(|| {
                PermissionsError::InvalidPayload(
                    "For shared secret there needs to be a valid secret.".to_string(),
                )
            })?;
            let secret = tokio::task::spawn_blocking(move || SecretHash::generate(&secret))
                .await
                .map_err(|e| PermissionsError::Hashing(e.to_string()))?
                .map_err(|e| PermissionsError::Hashing(e.to_string()))?;
            PermissionSetting::SharedSecret { secret }
        }
        SetPermissionRequest::NftOwnership { nft } => {
            let nft = nft.filter(|nft| !nft.is_empty()).ok_or_else(|| {
                PermissionsError::InvalidPayload(
                    "For nft ownership there needs to be a valid nft.".to_string(),
                )
            })?;
            PermissionSetting::NftOwnership { nft }
        }
    };

    if !kind.accepts(setting.policy_type()) {
        let message = match kind {
            PermissionKind::Deployment => {
                "Deployment permission needs to be 'allow-list'.".to_string()
            }
            PermissionKind::Streaming => {
                "Streaming permission needs to be either 'unrestricted' or 'allow-list'."
                    .to_string()
            }
            PermissionKind::Access => format!(
                "Need to provide a valid permission type: {}.",
                setting.policy_type()
            ),
        };
        return Err(PermissionsError::InvalidPayload(message));
    }

    Ok(setting)
}
