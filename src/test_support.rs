//! Shared fixtures for unit tests: signing identities, scene builders and
//! in-memory collaborators.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::application::dto::DeploymentToValidate;
use crate::application::ports::outbound::{
    BannedNamesPort, DenyListError, LimitsError, LimitsPort, NameOwnershipError,
    NameOwnershipPort, RepositoryError, RpcError, WorldsRepositoryPort,
};
use crate::application::services::validation::signature::EphemeralPayload;
use crate::application::services::NameDenyList;
use crate::domain::entities::{DeployedWorld, Entity, SceneDeployment, WorldMetadata};
use crate::domain::value_objects::content_hash::hash_v1;
use crate::domain::value_objects::{AuthChain, AuthLink, AuthLinkType, EthAddress, Permissions};

pub const ALICE: &str = "0x1111111111111111111111111111111111111111";

/// A wallet with a real secp256k1 key
pub struct Identity {
    signer: PrivateKeySigner,
}

impl Identity {
    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    /// Lower-cased hex address
    pub fn address(&self) -> String {
        format!("{:#x}", self.signer.address())
    }

    fn sign(&self, message: &str) -> String {
        let signature = self.signer.sign_message_sync(message.as_bytes()).unwrap();
        format!("0x{}", hex::encode(signature.as_bytes()))
    }

    /// Chain where this wallet signs the entity id directly
    pub fn sign_entity(&self, entity_id: &str) -> AuthChain {
        AuthChain::new(vec![
            AuthLink::signer(self.address()),
            AuthLink {
                link_type: AuthLinkType::EcdsaSignedEntity,
                payload: entity_id.to_string(),
                signature: self.sign(entity_id),
            },
        ])
    }

    /// Chain where this wallet delegates to a fresh ephemeral key valid until
    /// `expiration`, which then signs the entity id
    pub fn sign_entity_with_ephemeral(&self, entity_id: &str, expiration: DateTime<Utc>) -> AuthChain {
        let ephemeral = Identity::random();
        let payload = EphemeralPayload {
            address: ephemeral.signer.address(),
            expiration,
        }
        .to_payload();

        AuthChain::new(vec![
            AuthLink::signer(self.address()),
            AuthLink {
                link_type: AuthLinkType::EcdsaEphemeral,
                signature: self.sign(&payload),
                payload,
            },
            AuthLink {
                link_type: AuthLinkType::EcdsaSignedEntity,
                payload: entity_id.to_string(),
                signature: ephemeral.sign(entity_id),
            },
        ])
    }
}

fn scene_metadata(world_name: &str) -> Value {
    json!({
        "main": "bin/index.js",
        "scene": { "base": "0,0", "parcels": ["0,0"] },
        "runtimeVersion": "7",
        "worldConfiguration": { "name": world_name }
    })
}

/// Entity file bytes for `metadata` and `files`, its id and the content
/// files keyed by hash
fn build_scene(metadata: Value, files: &[(&str, &[u8])]) -> (String, Vec<u8>, BTreeMap<String, Vec<u8>>) {
    let pointers = metadata
        .pointer("/scene/parcels")
        .and_then(Value::as_array)
        .filter(|parcels| !parcels.is_empty())
        .cloned()
        .unwrap_or_else(|| vec![json!("0,0")]);

    let mut content_files = BTreeMap::new();
    let content: Vec<Value> = files
        .iter()
        .map(|(file, bytes)| {
            let hash = hash_v1(bytes);
            content_files.insert(hash.clone(), bytes.to_vec());
            json!({ "file": file, "hash": hash })
        })
        .collect();

    let raw = serde_json::to_vec(&json!({
        "version": "v3",
        "type": "scene",
        "pointers": pointers,
        "timestamp": Utc::now().timestamp_millis(),
        "content": content,
        "metadata": metadata,
    }))
    .unwrap();
    (hash_v1(&raw), raw, content_files)
}

/// A scene entity for `world_name` and its content files keyed by hash
pub fn scene_entity(world_name: &str, files: &[(&str, &[u8])]) -> (Entity, HashMap<String, Vec<u8>>) {
    let (id, raw, content_files) = build_scene(scene_metadata(world_name), files);
    let entity = Entity::from_json(id, &raw).unwrap();
    (entity, content_files.into_iter().collect())
}

/// A fresh, correctly signed deployment of a minimal scene to `world_name`
pub fn scene_deployment(
    identity: &Identity,
    world_name: &str,
    files: &[(&str, &[u8])],
) -> DeploymentToValidate {
    scene_deployment_with_metadata(identity, scene_metadata(world_name), files)
}

pub fn scene_deployment_with_metadata(
    identity: &Identity,
    metadata: Value,
    files: &[(&str, &[u8])],
) -> DeploymentToValidate {
    let (id, raw, content_files) = build_scene(metadata, files);
    let entity = Entity::from_json(id.clone(), &raw).unwrap();
    let auth_chain = identity.sign_entity(&id);

    let mut files: HashMap<String, Vec<u8>> = content_files.into_iter().collect();
    files.insert(id, raw);

    DeploymentToValidate {
        entity,
        files,
        auth_chain,
        content_hashes_in_storage: HashMap::new(),
    }
}

/// Ownership resolver that answers the same owner for every name
pub struct FixedOwnership {
    owner: Option<EthAddress>,
    unreachable: bool,
    calls: AtomicUsize,
}

impl FixedOwnership {
    pub fn owned_by(owner: &str) -> Self {
        Self {
            owner: Some(EthAddress::parse(owner).unwrap()),
            unreachable: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unowned() -> Self {
        Self {
            owner: None,
            unreachable: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every lookup fails as if the RPC node were down
    pub fn unreachable() -> Self {
        Self {
            owner: None,
            unreachable: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameOwnershipPort for FixedOwnership {
    async fn find_owner(&self, _name: &str) -> Result<Option<EthAddress>, NameOwnershipError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(RpcError::Transport("connection refused".to_string()).into());
        }
        Ok(self.owner.clone())
    }
}

#[derive(Default)]
struct WorldRow {
    scene: Option<SceneDeployment>,
    permissions: Option<Permissions>,
}

#[derive(Default)]
pub struct InMemoryWorldsRepository {
    rows: Mutex<BTreeMap<String, WorldRow>>,
}

impl InMemoryWorldsRepository {
    /// Last scene written for `name`
    pub fn scene(&self, name: &str) -> Option<SceneDeployment> {
        self.rows
            .lock()
            .unwrap()
            .get(&name.to_lowercase())
            .and_then(|row| row.scene.clone())
    }
}

#[async_trait]
impl WorldsRepositoryPort for InMemoryWorldsRepository {
    async fn get(&self, name: &str) -> Result<Option<WorldMetadata>, RepositoryError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.get(&name.to_lowercase()).map(|row| WorldMetadata {
            entity_id: row.scene.as_ref().map(|scene| scene.entity.id.clone()),
            runtime_metadata: row.scene.as_ref().map(|scene| scene.runtime_metadata.clone()),
            permissions: row.permissions.clone(),
        }))
    }

    async fn get_deployed_entity(&self, name: &str) -> Result<Option<Entity>, RepositoryError> {
        Ok(self.scene(name).map(|scene| scene.entity))
    }

    async fn upsert_scene(&self, deployment: &SceneDeployment) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        rows.entry(deployment.name.to_lowercase()).or_default().scene = Some(deployment.clone());
        Ok(())
    }

    async fn upsert_permissions(
        &self,
        name: &str,
        permissions: &Permissions,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        rows.entry(name.to_lowercase()).or_default().permissions = Some(permissions.clone());
        Ok(())
    }

    async fn list_deployed(&self) -> Result<Vec<DeployedWorld>, RepositoryError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter_map(|(name, row)| {
                row.scene.as_ref().map(|scene| DeployedWorld {
                    name: name.clone(),
                    entity: scene.entity.clone(),
                })
            })
            .collect())
    }

    async fn list_deployed_names(&self) -> Result<Vec<String>, RepositoryError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|(_, row)| row.scene.is_some())
            .map(|(name, _)| name.clone())
            .collect())
    }
}

/// Same limits for every world
pub struct StaticLimits {
    pub max_parcels: usize,
    pub max_size_mb: u64,
    pub allow_sdk6: bool,
    pub calls: AtomicUsize,
}

impl Default for StaticLimits {
    fn default() -> Self {
        Self {
            max_parcels: 4,
            max_size_mb: 100,
            allow_sdk6: false,
            calls: AtomicUsize::new(0),
        }
    }
}

impl StaticLimits {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LimitsPort for StaticLimits {
    async fn max_allowed_parcels_for(&self, _world_name: &str) -> Result<usize, LimitsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.max_parcels)
    }

    async fn max_allowed_size_in_mb_for(&self, _world_name: &str) -> Result<u64, LimitsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.max_size_mb)
    }

    async fn allow_sdk6_for(&self, _world_name: &str) -> Result<bool, LimitsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.allow_sdk6)
    }
}

struct StaticBannedNames(Vec<String>);

#[async_trait]
impl BannedNamesPort for StaticBannedNames {
    async fn fetch_banned_names(&self) -> Result<Vec<String>, DenyListError> {
        Ok(self.0.clone())
    }
}

/// Deny list over a fixed set of banned labels (no `.dcl.eth` suffix)
pub fn banned_names(names: &[&'static str]) -> NameDenyList {
    let names = names.iter().map(|name| name.to_string()).collect();
    NameDenyList::new(Some(Arc::new(StaticBannedNames(names))))
}
