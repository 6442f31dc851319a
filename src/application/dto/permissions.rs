use serde::{Deserialize, Serialize};

/// Body of a "set permission" request. The tag names the policy; the
/// payload carries what that policy needs.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SetPermissionRequest {
    Unrestricted,
    AllowList,
    SharedSecret {
        #[serde(default)]
        secret: Option<String>,
    },
    NftOwnership {
        #[serde(default)]
        nft: Option<String>,
    },
}

/// Deployment allow list of a world, as signed by its owner when changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlList {
    pub resource: String,
    #[serde(default)]
    pub allowed: Option<Vec<String>>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
