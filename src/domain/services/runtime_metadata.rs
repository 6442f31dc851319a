//! Runtime metadata projection of a deployed scene

use crate::domain::entities::{Entity, SceneDisplay, WorldConfiguration, WorldRuntimeMetadata};

/// Rewrite deprecated `worldConfiguration` aliases onto their current fields.
///
/// Records deployed before the aliases were retired may still carry them,
/// and very old ones have no `worldConfiguration` at all.
pub fn migrate_configuration(
    world_name: &str,
    configuration: Option<WorldConfiguration>,
) -> WorldConfiguration {
    let Some(mut configuration) = configuration else {
        return WorldConfiguration {
            name: Some(world_name.to_string()),
            ..Default::default()
        };
    };

    if let Some(dcl_name) = configuration.dcl_name.take() {
        configuration.name = Some(dcl_name);
    }

    if let Some(visible) = configuration.minimap_visible.take() {
        configuration
            .mini_map_config
            .get_or_insert_with(Default::default)
            .visible = Some(visible);
    }

    if let Some(fixed_time) = configuration.skybox.take() {
        configuration
            .skybox_config
            .get_or_insert_with(Default::default)
            .fixed_time = Some(fixed_time);
    }

    configuration
}

/// Build the read-side projection for `entity` deployed under `world_name`.
/// File names are resolved to content hashes.
pub fn extract_world_runtime_metadata(world_name: &str, entity: &Entity) -> WorldRuntimeMetadata {
    let metadata = entity.metadata.as_ref();
    let configuration = metadata
        .and_then(|m| m.get("worldConfiguration"))
        .and_then(|c| serde_json::from_value::<WorldConfiguration>(c.clone()).ok());
    let display = metadata
        .and_then(|m| m.get("display"))
        .and_then(|d| serde_json::from_value::<SceneDisplay>(d.clone()).ok());

    let configuration = migrate_configuration(world_name, configuration);
    let resolve = |file: Option<&String>| {
        file.and_then(|file| entity.hash_for_file(file))
            .map(str::to_string)
    };

    let mini_map = configuration.mini_map_config.as_ref();
    let skybox = configuration.skybox_config.as_ref();

    WorldRuntimeMetadata {
        name: configuration
            .name
            .clone()
            .unwrap_or_else(|| world_name.to_string()),
        entity_ids: vec![entity.id.clone()],
        fixed_adapter: configuration.fixed_adapter.clone(),
        minimap_visible: mini_map.and_then(|m| m.visible).unwrap_or(false),
        minimap_data_image: resolve(mini_map.and_then(|m| m.data_image.as_ref())),
        minimap_estate_image: resolve(mini_map.and_then(|m| m.estate_image.as_ref())),
        skybox_fixed_time: skybox.and_then(|s| s.fixed_time),
        skybox_textures: skybox.and_then(|s| s.textures.as_ref()).map(|textures| {
            textures
                .iter()
                .filter_map(|texture| resolve(Some(texture)))
                .collect()
        }),
        thumbnail_file: resolve(display.as_ref().and_then(|d| d.navmap_thumbnail.as_ref())),
    }
}
