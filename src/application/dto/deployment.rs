use std::collections::HashMap;

use serde::Serialize;

use crate::domain::entities::Entity;
use crate::domain::value_objects::AuthChain;

/// One candidate deployment. Lives for a single validation pass and is never
/// persisted.
#[derive(Debug, Clone)]
pub struct DeploymentToValidate {
    pub entity: Entity,
    /// Uploaded files by content hash, including the entity's own JSON under
    /// its id
    pub files: HashMap<String, Vec<u8>>,
    pub auth_chain: AuthChain,
    /// Whether each hash referenced by the entity is already stored
    pub content_hashes_in_storage: HashMap<String, bool>,
}

impl DeploymentToValidate {
    pub fn entity_raw(&self) -> Option<&[u8]> {
        self.files.get(&self.entity.id).map(Vec::as_slice)
    }

    pub fn signer(&self) -> Option<&str> {
        self.auth_chain.signer()
    }

    pub fn is_stored(&self, hash: &str) -> bool {
        self.content_hashes_in_storage.get(hash).copied().unwrap_or(false)
    }
}

/// Outcome of one validation pass. Failures are data, not errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn passed() -> Self {
        Self::default()
    }

    pub fn fail(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
        }
    }

    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Raw deployment as received from a client: the uploaded files keyed by hash
/// plus the declared entity id and auth chain
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    pub entity_id: String,
    pub auth_chain: AuthChain,
    pub files: HashMap<String, Vec<u8>>,
    /// Public base URL of this server, advertised to downstream consumers
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentResult {
    pub message: String,
}

/// Published after a scene deployment when a notification channel is set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentNotification {
    pub entity: NotifiedEntity,
    pub content_server_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifiedEntity {
    pub entity_id: String,
    pub auth_chain: AuthChain,
}
