//! Scene-specific checks
//!
//! These run only after every common check passed, so the entity JSON is
//! known to be authentic and complete.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::application::dto::{DeploymentToValidate, ValidationResult};
use crate::domain::entities::SceneMetadata;

pub const DCL_NAME_RENAMED: &str =
    "`dclName` in scene.json was renamed to `name`. Please update your scene.json accordingly.";
pub const MINIMAP_VISIBLE_DEPRECATED: &str = "`minimapVisible` in scene.json is deprecated in favor of `{ miniMapConfig: { visible } }`. Please update your scene.json accordingly.";
pub const SKYBOX_DEPRECATED: &str = "`skybox` in scene.json is deprecated in favor of `{ skyboxConfig: { fixedTime } }`. Please update your scene.json accordingly.";
pub const MISSING_WORLD_NAME: &str =
    "scene.json needs to specify a worldConfiguration section with a valid name inside.";

const BYTES_PER_MB: u64 = 1024 * 1024;

fn is_parcel(value: &str) -> bool {
    let Some((x, y)) = value.split_once(',') else {
        return false;
    };
    x.trim().parse::<i32>().is_ok() && y.trim().parse::<i32>().is_ok()
}

fn scene_metadata(deployment: &DeploymentToValidate) -> SceneMetadata {
    deployment.entity.scene_metadata().unwrap_or_default()
}

fn required_string<'a>(
    object: &'a Value,
    path: &str,
    property: &str,
    errors: &mut Vec<String>,
) -> Option<&'a str> {
    match object.get(property) {
        None => {
            let prefix = if path.is_empty() { String::new() } else { format!("{path} ") };
            errors.push(format!("{prefix}must have required property '{property}'"));
            None
        }
        Some(Value::String(value)) => Some(value),
        Some(_) => {
            errors.push(format!("{path}/{property} must be string"));
            None
        }
    }
}

/// Structural checks on scene metadata: main file, base parcel and parcels
pub fn validate_scene_entity(deployment: &DeploymentToValidate) -> ValidationResult {
    let entity = &deployment.entity;
    let Some(metadata) = entity.metadata.as_ref().filter(|m| m.is_object()) else {
        return ValidationResult::error("must be object");
    };

    let mut errors = Vec::new();
    let main = required_string(metadata, "", "main", &mut errors);

    match metadata.get("scene") {
        None => errors.push("must have required property 'scene'".to_string()),
        Some(scene) if !scene.is_object() => errors.push("/scene must be object".to_string()),
        Some(scene) => {
            let base = required_string(scene, "/scene", "base", &mut errors);
            match scene.get("parcels") {
                None => errors.push("/scene must have required property 'parcels'".to_string()),
                Some(Value::Array(parcels)) => {
                    if parcels.is_empty() {
                        errors.push("/scene/parcels must NOT have fewer than 1 items".to_string());
                    }
                    let mut valid = BTreeSet::new();
                    for (index, parcel) in parcels.iter().enumerate() {
                        match parcel.as_str().filter(|p| is_parcel(p)) {
                            Some(parcel) => {
                                valid.insert(parcel);
                            }
                            None => errors.push(format!(
                                "/scene/parcels/{index} must match pattern \"^-?[0-9]+,-?[0-9]+$\""
                            )),
                        }
                    }
                    if let Some(base) = base {
                        if !is_parcel(base) {
                            errors.push("/scene/base must match pattern \"^-?[0-9]+,-?[0-9]+$\"".to_string());
                        } else if !valid.contains(base) {
                            errors.push(format!("Base parcel {base} must be one of the scene parcels."));
                        }
                    }
                }
                Some(_) => errors.push("/scene/parcels must be array".to_string()),
            }
        }
    }

    for pointer in &entity.pointers {
        if !is_parcel(pointer) {
            errors.push(format!("Scene pointers must be parcel coordinates: {pointer}"));
        }
    }

    if let Some(main) = main {
        if !entity.has_file(main) {
            errors.push(format!("Main file {main} is not present in the entity."));
        }
    }

    if errors.is_empty() {
        if let Err(e) = serde_json::from_value::<SceneMetadata>(metadata.clone()) {
            errors.push(format!("Invalid scene metadata: {e}"));
        }
    }

    ValidationResult::fail(errors)
}

/// Rejects deprecated aliases and requires a world name
pub fn validate_world_configuration(deployment: &DeploymentToValidate) -> ValidationResult {
    let configuration = scene_metadata(deployment).world_configuration.unwrap_or_default();

    if configuration.dcl_name.is_some() {
        return ValidationResult::error(DCL_NAME_RENAMED);
    }
    if configuration.name.as_deref().unwrap_or_default().is_empty() {
        return ValidationResult::error(MISSING_WORLD_NAME);
    }

    let mut errors = Vec::new();
    if configuration.minimap_visible.is_some() {
        errors.push(MINIMAP_VISIBLE_DEPRECATED.to_string());
    }
    if configuration.skybox.is_some() {
        errors.push(SKYBOX_DEPRECATED.to_string());
    }
    ValidationResult::fail(errors)
}

pub fn validate_scene_dimensions(deployment: &DeploymentToValidate, max_parcels: usize) -> ValidationResult {
    if deployment.entity.pointers.len() > max_parcels {
        return ValidationResult::error(format!(
            "Max allowed scene dimensions is {max_parcels} parcels."
        ));
    }
    ValidationResult::passed()
}

pub fn validate_mini_map_images(deployment: &DeploymentToValidate) -> ValidationResult {
    let mini_map = scene_metadata(deployment)
        .world_configuration
        .and_then(|c| c.mini_map_config)
        .unwrap_or_default();

    let errors = [mini_map.data_image, mini_map.estate_image]
        .into_iter()
        .flatten()
        .filter(|image| !image.is_empty() && !deployment.entity.has_file(image))
        .map(|image| format!("The file {image} is not present in the entity."))
        .collect();
    ValidationResult::fail(errors)
}

pub fn validate_skybox_textures(deployment: &DeploymentToValidate) -> ValidationResult {
    let textures = scene_metadata(deployment)
        .world_configuration
        .and_then(|c| c.skybox_config)
        .and_then(|s| s.textures)
        .unwrap_or_default();

    let errors = textures
        .into_iter()
        .filter(|texture| !texture.is_empty() && !deployment.entity.has_file(texture))
        .map(|texture| format!("The texture file {texture} is not present in the entity."))
        .collect();
    ValidationResult::fail(errors)
}

pub fn validate_thumbnail(deployment: &DeploymentToValidate) -> ValidationResult {
    let thumbnail = scene_metadata(deployment)
        .display
        .and_then(|d| d.navmap_thumbnail)
        .filter(|t| !t.is_empty());

    match thumbnail {
        Some(thumbnail) if !deployment.entity.has_file(&thumbnail) => ValidationResult::error(format!(
            "Scene thumbnail '{thumbnail}' must be a file included in the deployment."
        )),
        _ => ValidationResult::passed(),
    }
}

pub fn validate_banned_name(world_name: &str, allowed: bool) -> ValidationResult {
    if allowed {
        return ValidationResult::passed();
    }
    ValidationResult::error(format!("Deployment failed: World \"{world_name}\" has been banned."))
}

pub fn validate_sdk_version(deployment: &DeploymentToValidate, allow_sdk6: bool) -> ValidationResult {
    let runtime_version = scene_metadata(deployment).runtime_version;
    if runtime_version.as_deref() != Some("7") && !allow_sdk6 {
        return ValidationResult::error(
            "Worlds are only supported on SDK 7. Please upgrade your scene to latest version of SDK.",
        );
    }
    ValidationResult::passed()
}

/// Distinct content hashes referenced by the entity that were not uploaded
pub fn hashes_needing_stored_size(deployment: &DeploymentToValidate) -> Vec<String> {
    let referenced: BTreeSet<&str> = deployment
        .entity
        .content
        .iter()
        .map(|c| c.hash.as_str())
        .collect();
    referenced
        .into_iter()
        .filter(|hash| !deployment.files.contains_key(*hash))
        .map(str::to_string)
        .collect()
}

/// Total size of the distinct referenced content against the per-world limit
pub fn validate_size(
    deployment: &DeploymentToValidate,
    stored_sizes: &HashMap<String, Option<u64>>,
    max_size_mb: u64,
) -> ValidationResult {
    let referenced: BTreeSet<&str> = deployment
        .entity
        .content
        .iter()
        .map(|c| c.hash.as_str())
        .collect();

    let mut total: u64 = 0;
    for hash in referenced {
        let size = match deployment.files.get(hash) {
            Some(bytes) => bytes.len() as u64,
            None => match stored_sizes.get(hash).copied().flatten() {
                Some(size) => size,
                None => {
                    return ValidationResult::error(format!(
                        "Couldn't fetch content file with hash {hash}"
                    ))
                }
            },
        };
        total += size;
    }

    let max_bytes = max_size_mb * BYTES_PER_MB;
    if total > max_bytes {
        return ValidationResult::error(format!(
            "The deployment is too big. The maximum total size allowed is {max_size_mb} MB for scenes. You can upload up to {max_bytes} bytes but you tried to upload {total}."
        ));
    }
    ValidationResult::passed()
}

pub fn deployment_permission_denied(world_name: &str) -> ValidationResult {
    ValidationResult::error(format!(
        "Deployment failed: Your wallet has no permission to publish this scene because it does not have permission to deploy under \"{world_name}\". Check scene.json to select a name that either you own or you were given permission to deploy."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{scene_deployment_with_metadata, Identity};
    use serde_json::json;

    fn with_metadata(metadata: Value, files: &[(&str, &[u8])]) -> DeploymentToValidate {
        scene_deployment_with_metadata(&Identity::random(), metadata, files)
    }

    fn base_metadata() -> Value {
        json!({
            "main": "bin/index.js",
            "scene": { "base": "0,0", "parcels": ["0,0"] },
            "runtimeVersion": "7",
            "worldConfiguration": { "name": "alice.dcl.eth" }
        })
    }

    fn main_file() -> Vec<(&'static str, &'static [u8])> {
        vec![("bin/index.js", b"main()".as_slice())]
    }

    fn patched(patch: impl FnOnce(&mut Value)) -> Value {
        let mut metadata = base_metadata();
        patch(&mut metadata);
        metadata
    }

    #[test]
    fn test_well_formed_scene_passes() {
        let d = with_metadata(base_metadata(), &main_file());

        assert!(validate_scene_entity(&d).ok());
        assert!(validate_world_configuration(&d).ok());
        assert!(validate_mini_map_images(&d).ok());
        assert!(validate_skybox_textures(&d).ok());
        assert!(validate_thumbnail(&d).ok());
        assert!(validate_sdk_version(&d, false).ok());
    }

    #[test]
    fn test_scene_schema_errors() {
        let no_main = with_metadata(patched(|m| {
                m.as_object_mut().unwrap().remove("main");
            }), &main_file());
        let bad_base = with_metadata(patched(|m| m["scene"]["base"] = json!("5,5")), &main_file());
        let no_main_file = with_metadata(base_metadata(), &[]);

        assert_eq!(
            validate_scene_entity(&no_main).errors,
            vec!["must have required property 'main'"]
        );
        assert_eq!(
            validate_scene_entity(&bad_base).errors,
            vec!["Base parcel 5,5 must be one of the scene parcels."]
        );
        assert_eq!(
            validate_scene_entity(&no_main_file).errors,
            vec!["Main file bin/index.js is not present in the entity."]
        );
    }

    #[test]
    fn test_deprecated_aliases_are_rejected() {
        let dcl_name = with_metadata(
            patched(|m| m["worldConfiguration"] = json!({ "dclName": "alice.dcl.eth" })),
            &main_file(),
        );
        let minimap = with_metadata(
            patched(|m| m["worldConfiguration"]["minimapVisible"] = json!(true)),
            &main_file(),
        );
        let skybox = with_metadata(
            patched(|m| m["worldConfiguration"]["skybox"] = json!(3600)),
            &main_file(),
        );

        assert_eq!(validate_world_configuration(&dcl_name).errors, vec![DCL_NAME_RENAMED]);
        assert_eq!(validate_world_configuration(&minimap).errors, vec![MINIMAP_VISIBLE_DEPRECATED]);
        assert_eq!(validate_world_configuration(&skybox).errors, vec![SKYBOX_DEPRECATED]);
    }

    #[test]
    fn test_world_name_is_required() {
        let d = with_metadata(
            patched(|m| {
                m.as_object_mut().unwrap().remove("worldConfiguration");
            }),
            &main_file(),
        );

        assert_eq!(validate_world_configuration(&d).errors, vec![MISSING_WORLD_NAME]);
    }

    #[test]
    fn test_scene_dimensions() {
        let d = with_metadata(base_metadata(), &main_file());

        assert!(validate_scene_dimensions(&d, 1).ok());
        assert_eq!(
            validate_scene_dimensions(&d, 0).errors,
            vec!["Max allowed scene dimensions is 0 parcels."]
        );
    }

    #[test]
    fn test_referenced_images_must_be_in_content() {
        let d = with_metadata(
            patched(|m| {
                m["worldConfiguration"]["miniMapConfig"] =
                    json!({ "dataImage": "data.png", "estateImage": "estate.png" });
                m["worldConfiguration"]["skyboxConfig"] = json!({ "textures": ["sky.png"] });
                m["display"] = json!({ "navmapThumbnail": "thumb.png" });
            }),
            &[("bin/index.js", b"main()".as_slice()), ("data.png", b"png".as_slice())],
        );

        assert_eq!(
            validate_mini_map_images(&d).errors,
            vec!["The file estate.png is not present in the entity."]
        );
        assert_eq!(
            validate_skybox_textures(&d).errors,
            vec!["The texture file sky.png is not present in the entity."]
        );
        assert_eq!(
            validate_thumbnail(&d).errors,
            vec!["Scene thumbnail 'thumb.png' must be a file included in the deployment."]
        );
    }

    #[test]
    fn test_sdk6_needs_permission() {
        let d = with_metadata(patched(|m| m["runtimeVersion"] = json!("6")), &main_file());

        assert!(!validate_sdk_version(&d, false).ok());
        assert!(validate_sdk_version(&d, true).ok());
    }

    #[test]
    fn test_size_counts_uploaded_and_stored_content() {
        let big = vec![0u8; 600 * 1024];
        let mut d = with_metadata(
            base_metadata(),
            &[("bin/index.js", b"main()".as_slice()), ("big.bin", big.as_slice())],
        );
        let big_hash = d.entity.hash_for_file("big.bin").unwrap().to_string();
        d.files.remove(&big_hash);

        assert_eq!(hashes_needing_stored_size(&d), vec![big_hash.clone()]);

        let missing = validate_size(&d, &HashMap::new(), 1);
        let stored = HashMap::from([(big_hash.clone(), Some(600 * 1024))]);
        let fits = validate_size(&d, &stored, 1);
        let over = HashMap::from([(big_hash.clone(), Some(2 * 1024 * 1024))]);
        let too_big = validate_size(&d, &over, 1);

        assert_eq!(
            missing.errors,
            vec![format!("Couldn't fetch content file with hash {big_hash}")]
        );
        assert!(fits.ok());
        assert_eq!(
            too_big.errors,
            vec![format!(
                "The deployment is too big. The maximum total size allowed is 1 MB for scenes. You can upload up to 1048576 bytes but you tried to upload {}.",
                2 * 1024 * 1024 + 6
            )]
        );
    }

    #[test]
    fn test_banned_name_message() {
        assert_eq!(
            validate_banned_name("evil.dcl.eth", false).errors,
            vec!["Deployment failed: World \"evil.dcl.eth\" has been banned."]
        );
        assert!(validate_banned_name("fine.dcl.eth", true).ok());
    }
}
