//! Scene metadata carried by `scene` entities

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneMetadata {
    pub main: String,
    pub scene: SceneParcels,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<SceneDisplay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_configuration: Option<WorldConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneParcels {
    pub base: String,
    pub parcels: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDisplay {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub navmap_thumbnail: Option<String>,
}

/// `worldConfiguration` section of scene.json.
///
/// `dcl_name`, `minimap_visible` and `skybox` are deprecated aliases; new
/// deployments carrying them are rejected, stored legacy records are migrated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dcl_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimap_visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skybox: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mini_map_config: Option<MiniMapConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skybox_config: Option<SkyboxConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_adapter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiniMapConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estate_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkyboxConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textures: Option<Vec<String>>,
}
