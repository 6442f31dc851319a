//! Checks that apply to every entity type

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::signature;
use crate::application::dto::{DeploymentToValidate, ValidationResult};
use crate::domain::entities::EntityType;
use crate::domain::value_objects::content_hash::{hash_v1, is_cid_v1};
use crate::domain::value_objects::{AuthChain, AuthLinkType, EthAddress};

pub fn validate_entity_id(deployment: &DeploymentToValidate) -> ValidationResult {
    let Some(raw) = deployment.entity_raw() else {
        return ValidationResult::error("Entity not found in files.");
    };

    let computed = hash_v1(raw);
    if computed != deployment.entity.id {
        return ValidationResult::error(format!(
            "Invalid entity hash: expected {} but got {}",
            computed, deployment.entity.id
        ));
    }
    ValidationResult::passed()
}

pub fn validate_base_entity(deployment: &DeploymentToValidate) -> ValidationResult {
    let entity = &deployment.entity;
    let mut errors = Vec::new();

    if entity.version != "v3" {
        errors.push(format!("/version must be equal to constant 'v3' but got '{}'", entity.version));
    }
    if entity.pointers.is_empty() {
        errors.push("/pointers must NOT have fewer than 1 items".to_string());
    }
    if entity.pointers.iter().any(|pointer| pointer.trim().is_empty()) {
        errors.push("/pointers must NOT contain empty items".to_string());
    }
    if entity.timestamp < 0 {
        errors.push("/timestamp must be >= 0".to_string());
    }
    for (index, mapping) in entity.content.iter().enumerate() {
        if mapping.file.is_empty() {
            errors.push(format!("/content/{index}/file must NOT have fewer than 1 characters"));
        }
        if mapping.hash.is_empty() {
            errors.push(format!("/content/{index}/hash must NOT have fewer than 1 characters"));
        }
    }

    ValidationResult::fail(errors)
}

pub fn validate_auth_chain(deployment: &DeploymentToValidate) -> ValidationResult {
    let links = deployment.auth_chain.links();
    if links.is_empty() {
        return ValidationResult::error("must NOT have fewer than 1 items");
    }
    if links.len() > AuthChain::MAX_LINKS {
        return ValidationResult::error(format!(
            "must NOT have more than {} items",
            AuthChain::MAX_LINKS
        ));
    }

    let mut errors = Vec::new();
    if links[0].link_type != AuthLinkType::Signer {
        errors.push("/0/type must be equal to constant 'SIGNER'".to_string());
    }
    for (index, link) in links.iter().enumerate().skip(1) {
        if link.signature.is_empty() {
            errors.push(format!("/{index}/signature must NOT have fewer than 1 characters"));
        }
        if link.payload.is_empty() {
            errors.push(format!("/{index}/payload must NOT have fewer than 1 characters"));
        }
    }
    ValidationResult::fail(errors)
}

pub fn validate_signer(deployment: &DeploymentToValidate) -> ValidationResult {
    let signer = deployment.signer().unwrap_or_default();
    if !EthAddress::is_valid(signer) {
        return ValidationResult::error(format!("Invalid signer: {signer}"));
    }
    ValidationResult::passed()
}

pub fn validate_signature(deployment: &DeploymentToValidate, now: DateTime<Utc>) -> ValidationResult {
    match signature::validate_signature(&deployment.entity.id, &deployment.auth_chain, now) {
        Ok(()) => ValidationResult::passed(),
        Err(message) => ValidationResult::error(message),
    }
}

pub fn validate_deployment_ttl(
    deployment: &DeploymentToValidate,
    now: DateTime<Utc>,
    max_ttl_ms: i64,
) -> ValidationResult {
    let ttl = now.timestamp_millis() - deployment.entity.timestamp;
    if ttl > max_ttl_ms {
        return ValidationResult::error(format!(
            "Deployment was created {} secs ago. Max allowed: {} secs.",
            ttl as f64 / 1000.0,
            max_ttl_ms as f64 / 1000.0
        ));
    }
    ValidationResult::passed()
}

pub fn validate_files(deployment: &DeploymentToValidate) -> ValidationResult {
    let entity = &deployment.entity;
    let referenced: HashSet<&str> = entity.content.iter().map(|c| c.hash.as_str()).collect();
    let mut errors = Vec::new();

    let mut uploaded: Vec<(&String, &Vec<u8>)> = deployment.files.iter().collect();
    uploaded.sort_by(|a, b| a.0.cmp(b.0));
    for (hash, bytes) in uploaded {
        if !referenced.contains(hash.as_str()) && *hash != entity.id {
            errors.push(format!("Extra file detected {hash}"));
        }
        if !is_cid_v1(hash) {
            errors.push(format!("Only CIDv1 are allowed for content files: {hash}"));
        }
        if hash_v1(bytes) != *hash {
            errors.push(format!("The hashed file doesn't match the provided content: {hash}"));
        }
    }

    for mapping in &entity.content {
        let present =
            deployment.files.contains_key(&mapping.hash) || deployment.is_stored(&mapping.hash);
        if !present {
            errors.push(format!(
                "The file {} ({}) is neither present in the storage or in the provided entity",
                mapping.hash, mapping.file
            ));
        }
    }

    ValidationResult::fail(errors)
}

/// Entity types this server accepts deployments for
pub fn is_deployable(entity_type: &EntityType) -> bool {
    match entity_type {
        EntityType::Scene => true,
        EntityType::Profile
        | EntityType::Wearable
        | EntityType::Store
        | EntityType::Emote
        | EntityType::Outfits
        | EntityType::Unknown(_) => false,
    }
}

pub fn validate_supported_entity_type(deployment: &DeploymentToValidate) -> ValidationResult {
    let entity_type = &deployment.entity.entity_type;
    if !is_deployable(entity_type) {
        return ValidationResult::error(format!("Entity type {entity_type} is not supported."));
    }
    ValidationResult::passed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{scene_deployment, Identity};
    use chrono::Duration;

    fn deployment() -> DeploymentToValidate {
        scene_deployment(&Identity::random(), "alice.dcl.eth", &[("main.js", b"log()".as_slice())])
    }

    #[test]
    fn test_valid_deployment_passes_every_common_check() {
        let d = deployment();
        let now = Utc::now();

        assert!(validate_entity_id(&d).ok());
        assert!(validate_base_entity(&d).ok());
        assert!(validate_auth_chain(&d).ok());
        assert!(validate_signer(&d).ok());
        assert!(validate_signature(&d, now).ok());
        assert!(validate_deployment_ttl(&d, now, 300_000).ok());
        assert!(validate_files(&d).ok());
        assert!(validate_supported_entity_type(&d).ok());
    }

    #[test]
    fn test_entity_id_mismatch() {
        let mut d = deployment();
        let raw = d.files.remove(&d.entity.id).unwrap();
        let expected = hash_v1(&raw);
        d.entity.id = "bafkreidiq6d5r7yujricy72476vp4lgfrdmga6pz32edatbgwdfztturyy".to_string();
        d.files.insert(d.entity.id.clone(), raw);

        let result = validate_entity_id(&d);

        assert_eq!(
            result.errors,
            vec![format!("Invalid entity hash: expected {} but got {}", expected, d.entity.id)]
        );
    }

    #[test]
    fn test_entity_file_missing() {
        let mut d = deployment();
        d.files.remove(&d.entity.id);

        assert_eq!(validate_entity_id(&d).errors, vec!["Entity not found in files."]);
    }

    #[test]
    fn test_invalid_signer() {
        let mut d = deployment();
        let mut links = d.auth_chain.links().to_vec();
        links[0].payload = "not-an-address".to_string();
        d.auth_chain = AuthChain::new(links);

        assert_eq!(validate_signer(&d).errors, vec!["Invalid signer: not-an-address"]);
    }

    #[test]
    fn test_auth_chain_schema() {
        let mut d = deployment();
        d.auth_chain = AuthChain::default();
        assert!(!validate_auth_chain(&d).ok());

        let mut d = deployment();
        let mut links = d.auth_chain.links().to_vec();
        links[1].signature.clear();
        d.auth_chain = AuthChain::new(links);
        assert_eq!(
            validate_auth_chain(&d).errors,
            vec!["/1/signature must NOT have fewer than 1 characters"]
        );
    }

    #[test]
    fn test_stale_deployment() {
        let d = deployment();
        let now = Utc::now() + Duration::seconds(301);

        let result = validate_deployment_ttl(&d, now, 300_000);

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("Deployment was created 30"));
        assert!(result.errors[0].ends_with("Max allowed: 300 secs."));
    }

    #[test]
    fn test_extra_and_tampered_files() {
        let mut d = deployment();
        let extra = hash_v1(b"extra");
        d.files.insert(extra.clone(), b"extra".to_vec());
        let main_hash = d.entity.hash_for_file("main.js").unwrap().to_string();
        d.files.insert(main_hash.clone(), b"tampered".to_vec());

        let errors = validate_files(&d).errors;

        assert!(errors.contains(&format!("Extra file detected {extra}")));
        assert!(errors.contains(&format!(
            "The hashed file doesn't match the provided content: {main_hash}"
        )));
    }

    #[test]
    fn test_legacy_hash_rejected() {
        let mut d = deployment();
        let legacy = "QmUsqJaHc1JoNvjVbkwUiVMnJ8CSxAPbbxBiJ4DoNJRkFs".to_string();
        d.files.insert(legacy.clone(), b"legacy".to_vec());

        let errors = validate_files(&d).errors;

        assert!(errors.contains(&format!("Only CIDv1 are allowed for content files: {legacy}")));
    }

    #[test]
    fn test_missing_file_may_come_from_storage() {
        let mut d = deployment();
        let main_hash = d.entity.hash_for_file("main.js").unwrap().to_string();
        d.files.remove(&main_hash);

        let missing = validate_files(&d);
        d.content_hashes_in_storage.insert(main_hash.clone(), true);
        let stored = validate_files(&d);

        assert_eq!(
            missing.errors,
            vec![format!(
                "The file {main_hash} (main.js) is neither present in the storage or in the provided entity"
            )]
        );
        assert!(stored.ok());
    }

    #[test]
    fn test_only_scenes_are_deployable() {
        let mut d = deployment();
        d.entity.entity_type = EntityType::Wearable;

        assert_eq!(
            validate_supported_entity_type(&d).errors,
            vec!["Entity type wearable is not supported."]
        );
    }
}
