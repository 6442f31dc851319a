//! Permission checker engine
//!
//! A [`PermissionChecker`] is compiled once from a world's [`Permissions`]:
//! one check per [`PermissionKind`]. Policy/kind mismatches are rejected at
//! construction, so checking itself never fails.

use std::collections::HashSet;

use tracing::debug;

use crate::domain::value_objects::{
    PermissionKind, PermissionSetting, Permissions, PolicyType, SecretHash,
};

/// Caller-presented proof, tagged like the policy it is meant for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionExtras {
    SharedSecret { secret: String },
    NftOwnership { nft: String },
}

impl PermissionExtras {
    pub fn shared_secret(secret: impl Into<String>) -> Self {
        PermissionExtras::SharedSecret {
            secret: secret.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionConfigError {
    #[error("Invalid permission type '{policy}' for permission '{kind}'.")]
    UnsupportedPolicy {
        kind: PermissionKind,
        policy: PolicyType,
    },
}

#[derive(Debug, Clone)]
enum Check {
    Unrestricted,
    AllowList(HashSet<String>),
    SharedSecret(SecretHash),
    /// Always denies; on-chain verification is not implemented
    NftOwnership(String),
}

impl Check {
    fn compile(kind: PermissionKind, setting: &PermissionSetting) -> Result<Self, PermissionConfigError> {
        let policy = setting.policy_type();
        if !kind.accepts(policy) {
            return Err(PermissionConfigError::UnsupportedPolicy { kind, policy });
        }

        Ok(match setting {
            PermissionSetting::Unrestricted => Check::Unrestricted,
            PermissionSetting::AllowList { wallets } => Check::AllowList(
                wallets.iter().map(|wallet| wallet.to_ascii_lowercase()).collect(),
            ),
            PermissionSetting::SharedSecret { secret } => Check::SharedSecret(secret.clone()),
            PermissionSetting::NftOwnership { nft } => Check::NftOwnership(nft.clone()),
        })
    }

    fn allows(&self, wallet: &str, extras: Option<&PermissionExtras>) -> bool {
        match self {
            Check::Unrestricted => true,
            Check::AllowList(wallets) => wallets.contains(&wallet.to_ascii_lowercase()),
            Check::SharedSecret(hash) => match extras {
                Some(PermissionExtras::SharedSecret { secret }) => hash.verify(secret),
                _ => false,
            },
            Check::NftOwnership(nft) => {
                debug!(nft = %nft, wallet = %wallet, "NFT ownership is not verified, denying");
                false
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PermissionChecker {
    deployment: Check,
    access: Check,
    streaming: Check,
}

impl PermissionChecker {
    pub fn new(permissions: &Permissions) -> Result<Self, PermissionConfigError> {
        Ok(Self {
            deployment: Check::compile(PermissionKind::Deployment, &permissions.deployment)?,
            access: Check::compile(PermissionKind::Access, &permissions.access)?,
            streaming: Check::compile(PermissionKind::Streaming, &permissions.streaming)?,
        })
    }

    pub fn check_permission(
        &self,
        kind: PermissionKind,
        wallet: &str,
        extras: Option<&PermissionExtras>,
    ) -> bool {
        let check = match kind {
            PermissionKind::Deployment => &self.deployment,
            PermissionKind::Access => &self.access,
            PermissionKind::Streaming => &self.streaming,
        };
        check.allows(wallet, extras)
    }
}
