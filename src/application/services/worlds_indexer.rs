//! Worlds index - a summary of every deployed world for discovery clients

use std::sync::Arc;

use chrono::Utc;

use super::worlds_manager::{WorldsError, WorldsManager};
use crate::application::dto::{SceneData, WorldData, WorldsIndex};
use crate::domain::entities::Entity;

pub struct WorldsIndexer {
    worlds: Arc<WorldsManager>,
}

impl WorldsIndexer {
    pub fn new(worlds: Arc<WorldsManager>) -> Self {
        Self { worlds }
    }

    pub async fn get_index(&self) -> Result<WorldsIndex, WorldsError> {
        let index = self
            .worlds
            .get_deployed_world_entities()
            .await?
            .iter()
            .map(world_data)
            .collect();

        Ok(WorldsIndex {
            index,
            timestamp: Utc::now(),
        })
    }
}

fn world_data(entity: &Entity) -> WorldData {
    let display = entity
        .scene_metadata()
        .and_then(|metadata| metadata.display)
        .unwrap_or_default();
    // the thumbnail is published as the hash of the file the scene names
    let thumbnail = display
        .navmap_thumbnail
        .as_deref()
        .and_then(|file| entity.hash_for_file(file))
        .map(str::to_string);
    let runtime_version = entity
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.get("runtimeVersion"))
        .and_then(|version| version.as_str())
        .map(str::to_string);

    WorldData {
        name: entity.world_name().unwrap_or_default().to_string(),
        scenes: vec![SceneData {
            id: entity.id.clone(),
            title: display.title.unwrap_or_default(),
            description: display.description.unwrap_or_default(),
            thumbnail,
            pointers: entity.pointers.clone(),
            runtime_version,
            timestamp: entity.timestamp,
        }],
    }
}
