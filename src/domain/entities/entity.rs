//! Entity - immutable, content-addressed deployment descriptor

use serde::{Deserialize, Serialize};

use super::SceneMetadata;

/// Entity types known to the content protocol. Only some are deployable here.
///
/// Unrecognized types decode into `Unknown` so they can be rejected by
/// validation with a proper message instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntityType {
    Scene,
    Profile,
    Wearable,
    Store,
    Emote,
    Outfits,
    Unknown(String),
}

impl EntityType {
    pub fn as_str(&self) -> &str {
        match self {
            EntityType::Scene => "scene",
            EntityType::Profile => "profile",
            EntityType::Wearable => "wearable",
            EntityType::Store => "store",
            EntityType::Emote => "emote",
            EntityType::Outfits => "outfits",
            EntityType::Unknown(other) => other,
        }
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "scene" => EntityType::Scene,
            "profile" => EntityType::Profile,
            "wearable" => EntityType::Wearable,
            "store" => EntityType::Store,
            "emote" => EntityType::Emote,
            "outfits" => EntityType::Outfits,
            _ => EntityType::Unknown(value),
        }
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        match value {
            EntityType::Unknown(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file of the entity and the content hash it is stored under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMapping {
    pub file: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default = "default_version")]
    pub version: String,
    /// Content hash of the entity file; not part of the hashed JSON itself
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub pointers: Vec<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    #[serde(default)]
    pub content: Vec<ContentMapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

fn default_version() -> String {
    "v3".to_string()
}

impl Entity {
    /// Decode an entity file and attach the id it was stored under
    pub fn from_json(id: impl Into<String>, raw: &[u8]) -> Result<Self, serde_json::Error> {
        let mut entity: Entity = serde_json::from_slice(raw)?;
        entity.id = id.into();
        Ok(entity)
    }

    /// Scene metadata, if the metadata decodes as such
    pub fn scene_metadata(&self) -> Option<SceneMetadata> {
        self.metadata
            .as_ref()
            .and_then(|metadata| serde_json::from_value(metadata.clone()).ok())
    }

    /// `worldConfiguration.name` read straight from the raw metadata
    pub fn world_name(&self) -> Option<&str> {
        self.metadata
            .as_ref()?
            .get("worldConfiguration")?
            .get("name")?
            .as_str()
            .filter(|name| !name.is_empty())
    }

    /// Hash of the content entry whose file name is `file`
    pub fn hash_for_file(&self, file: &str) -> Option<&str> {
        self.content
            .iter()
            .find(|mapping| mapping.file == file)
            .map(|mapping| mapping.hash.as_str())
    }

    pub fn has_file(&self, file: &str) -> bool {
        self.hash_for_file(file).is_some()
    }
}
