//! World permission policies
//!
//! Each world carries one policy per [`PermissionKind`]. Policies are stored
//! as tagged JSON (`{"type": "allow-list", "wallets": [...]}`), so an
//! unknown `type` fails when the record is decoded instead of silently
//! denying at check time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::SecretHash;

/// Independently configurable guard points of a world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionKind {
    Deployment,
    Access,
    Streaming,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 3] = [
        PermissionKind::Deployment,
        PermissionKind::Access,
        PermissionKind::Streaming,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Deployment => "deployment",
            PermissionKind::Access => "access",
            PermissionKind::Streaming => "streaming",
        }
    }

    /// Whether `policy` is an acceptable variant for this kind
    pub fn accepts(&self, policy: PolicyType) -> bool {
        match self {
            PermissionKind::Deployment => matches!(policy, PolicyType::AllowList),
            PermissionKind::Streaming => {
                matches!(policy, PolicyType::Unrestricted | PolicyType::AllowList)
            }
            PermissionKind::Access => true,
        }
    }
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deployment" => Ok(PermissionKind::Deployment),
            "access" => Ok(PermissionKind::Access),
            "streaming" => Ok(PermissionKind::Streaming),
            other => Err(format!("Invalid permission name: {}", other)),
        }
    }
}

/// Tag of a [`PermissionSetting`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyType {
    Unrestricted,
    SharedSecret,
    NftOwnership,
    AllowList,
}

impl PolicyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyType::Unrestricted => "unrestricted",
            PolicyType::SharedSecret => "shared-secret",
            PolicyType::NftOwnership => "nft-ownership",
            PolicyType::AllowList => "allow-list",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Enforcement mechanism configured for one permission kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PermissionSetting {
    Unrestricted,
    SharedSecret { secret: SecretHash },
    NftOwnership { nft: String },
    AllowList { wallets: Vec<String> },
}

impl PermissionSetting {
    pub fn allow_list() -> Self {
        PermissionSetting::AllowList {
            wallets: Vec::new(),
        }
    }

    pub fn policy_type(&self) -> PolicyType {
        match self {
            PermissionSetting::Unrestricted => PolicyType::Unrestricted,
            PermissionSetting::SharedSecret { .. } => PolicyType::SharedSecret,
            PermissionSetting::NftOwnership { .. } => PolicyType::NftOwnership,
            PermissionSetting::AllowList { .. } => PolicyType::AllowList,
        }
    }
}

/// The full policy set of a world
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    pub deployment: PermissionSetting,
    pub access: PermissionSetting,
    pub streaming: PermissionSetting,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            deployment: PermissionSetting::allow_list(),
            access: PermissionSetting::Unrestricted,
            streaming: PermissionSetting::allow_list(),
        }
    }
}

impl Permissions {
    pub fn get(&self, kind: PermissionKind) -> &PermissionSetting {
        match kind {
            PermissionKind::Deployment => &self.deployment,
            PermissionKind::Access => &self.access,
            PermissionKind::Streaming => &self.streaming,
        }
    }

    pub fn get_mut(&mut self, kind: PermissionKind) -> &mut PermissionSetting {
        match kind {
            PermissionKind::Deployment => &mut self.deployment,
            PermissionKind::Access => &mut self.access,
            PermissionKind::Streaming => &mut self.streaming,
        }
    }

    pub fn set(&mut self, kind: PermissionKind, setting: PermissionSetting) {
        *self.get_mut(kind) = setting;
    }

    /// Copy safe to hand to external callers: shared-secret hashes removed
    pub fn without_secrets(&self) -> PublicPermissions {
        PublicPermissions {
            deployment: PublicPermissionSetting::from(&self.deployment),
            access: PublicPermissionSetting::from(&self.access),
            streaming: PublicPermissionSetting::from(&self.streaming),
        }
    }
}

/// Externally visible form of a [`PermissionSetting`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PublicPermissionSetting {
    Unrestricted,
    SharedSecret,
    NftOwnership { nft: String },
    AllowList { wallets: Vec<String> },
}

impl From<&PermissionSetting> for PublicPermissionSetting {
    fn from(setting: &PermissionSetting) -> Self {
        match setting {
            PermissionSetting::Unrestricted => PublicPermissionSetting::Unrestricted,
            PermissionSetting::SharedSecret { .. } => PublicPermissionSetting::SharedSecret,
            PermissionSetting::NftOwnership { nft } => {
                PublicPermissionSetting::NftOwnership { nft: nft.clone() }
            }
            PermissionSetting::AllowList { wallets } => PublicPermissionSetting::AllowList {
                wallets: wallets.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicPermissions {
    pub deployment: PublicPermissionSetting,
    pub access: PublicPermissionSetting,
    pub streaming: PublicPermissionSetting,
}
