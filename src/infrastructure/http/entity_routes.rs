//! Entity deployment route

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::application::dto::{DeploymentRequest, DeploymentResult};
use crate::application::services::{DeploymentError, DeploymentOutcome};
use crate::domain::value_objects::{AuthChain, AuthLink, AuthLinkType};
use crate::infrastructure::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub creation_timestamp: i64,
    #[serde(flatten)]
    pub result: DeploymentResult,
}

/// `authChain[<index>][<attribute>]` form fields of one link
#[derive(Debug, Default)]
struct LinkFields {
    link_type: Option<String>,
    payload: Option<String>,
    signature: Option<String>,
}

/// Uploaded deployment: entity id, auth chain and files keyed by hash
#[derive(Debug, Default)]
struct DeploymentForm {
    entity_id: Option<String>,
    links: BTreeMap<usize, LinkFields>,
    files: HashMap<String, Vec<u8>>,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

/// Split `authChain[3][payload]` into `(3, "payload")`
fn auth_chain_field(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix("authChain[")?;
    let (index, rest) = rest.split_once(']')?;
    let attribute = rest.strip_prefix('[')?.strip_suffix(']')?;
    Some((index.parse().ok()?, attribute))
}

impl DeploymentForm {
    fn set_field(&mut self, name: &str, value: String) {
        if name == "entityId" {
            self.entity_id = Some(value);
            return;
        }
        if let Some((index, attribute)) = auth_chain_field(name) {
            let link = self.links.entry(index).or_default();
            match attribute {
                "type" => link.link_type = Some(value),
                "payload" => link.payload = Some(value),
                "signature" => link.signature = Some(value),
                _ => {}
            }
        }
    }

    fn auth_chain(&mut self) -> Result<AuthChain, String> {
        if self.links.is_empty() {
            return Err("Missing auth chain".to_string());
        }
        let mut links = Vec::with_capacity(self.links.len());
        for (expected, (index, fields)) in std::mem::take(&mut self.links).into_iter().enumerate() {
            if index != expected {
                return Err(format!("Missing auth chain link {expected}"));
            }
            let link_type: AuthLinkType = fields
                .link_type
                .and_then(|value| serde_json::from_value(serde_json::Value::String(value)).ok())
                .ok_or_else(|| format!("Invalid type for auth chain link {index}"))?;
            links.push(AuthLink {
                link_type,
                payload: fields
                    .payload
                    .ok_or_else(|| format!("Missing payload for auth chain link {index}"))?,
                signature: fields.signature.unwrap_or_default(),
            });
        }
        Ok(AuthChain::new(links))
    }
}

async fn read_form(mut multipart: Multipart) -> Result<DeploymentForm, (StatusCode, String)> {
    let mut form = DeploymentForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if field.file_name().is_some() {
            let bytes = field.bytes().await.map_err(|e| bad_request(e.body_text()))?;
            form.files.insert(name, bytes.to_vec());
        } else {
            let value = field.text().await.map_err(|e| bad_request(e.body_text()))?;
            form.set_field(&name, value);
        }
    }
    Ok(form)
}

/// Validate and store a scene deployment sent as multipart form data
pub async fn deploy_entity(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DeployResponse>, (StatusCode, String)> {
    let mut form = read_form(multipart).await?;
    let entity_id = form
        .entity_id
        .take()
        .ok_or_else(|| bad_request("A string was expected for entityId"))?;
    let auth_chain = form.auth_chain().map_err(bad_request)?;

    let outcome = state
        .deployments
        .deploy(DeploymentRequest {
            entity_id,
            auth_chain,
            files: form.files,
            base_url: state.config.base_url.clone(),
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Deployment could not be processed");
            let status = match &e {
                DeploymentError::Validation(_) => StatusCode::SERVICE_UNAVAILABLE,
                DeploymentError::Storage(_) | DeploymentError::Deployer(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            (status, e.to_string())
        })?;

    match outcome {
        DeploymentOutcome::Deployed(result) => Ok(Json(DeployResponse {
            creation_timestamp: Utc::now().timestamp_millis(),
            result,
        })),
        DeploymentOutcome::Rejected(result) => Err(bad_request(format!(
            "Deployment failed: {}",
            result.errors.join(", ")
        ))),
    }
}
