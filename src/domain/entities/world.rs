//! World metadata - the authoritative state of a named world slot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Entity;
use crate::domain::value_objects::{AuthChain, Permissions};

/// Read-optimized projection of the deployed scene, computed at write time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldRuntimeMetadata {
    pub entity_ids: Vec<String>,
    pub name: String,
    pub minimap_visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimap_data_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimap_estate_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skybox_fixed_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skybox_textures: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_adapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_file: Option<String>,
}

/// What the store knows about a world. A permission-only record has no
/// entity yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldMetadata {
    pub entity_id: Option<String>,
    pub runtime_metadata: Option<WorldRuntimeMetadata>,
    pub permissions: Option<Permissions>,
}

impl WorldMetadata {
    pub fn permissions_or_default(&self) -> Permissions {
        self.permissions.clone().unwrap_or_default()
    }

    pub fn has_deployment(&self) -> bool {
        self.entity_id.is_some()
    }
}

/// Row written on every accepted scene deployment
#[derive(Debug, Clone)]
pub struct SceneDeployment {
    /// Case-folded world name
    pub name: String,
    pub entity: Entity,
    pub deployer: String,
    pub deployment_auth_chain: AuthChain,
    pub runtime_metadata: WorldRuntimeMetadata,
    pub owner: Option<String>,
    pub size: u64,
    pub deployed_at: DateTime<Utc>,
}

/// A deployed world as returned by the full-scan listings
#[derive(Debug, Clone)]
pub struct DeployedWorld {
    pub name: String,
    pub entity: Entity,
}
