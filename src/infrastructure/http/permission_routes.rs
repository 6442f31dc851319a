//! Permission and ACL routes
//!
//! Writes are signed by the world owner: permission routes through signed
//! fetch headers, ACL changes through an auth chain in the body.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    Json,
};
use chrono::Utc;

use super::signed_fetch::{self, SignedRequest};
use crate::application::dto::{AccessControlList, SetPermissionRequest};
use crate::application::services::validation::signature::verify_signed_payload;
use crate::application::services::PermissionsError;
use crate::domain::value_objects::{AuthChain, PermissionKind};
use crate::infrastructure::state::AppState;

fn permissions_error(e: PermissionsError) -> (StatusCode, String) {
    match &e {
        PermissionsError::NotOwner(_) => (StatusCode::FORBIDDEN, e.to_string()),
        _ if e.is_client_error() => (StatusCode::BAD_REQUEST, e.to_string()),
        _ => {
            tracing::error!(error = %e, "Permissions request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

fn permission_kind(name: &str) -> Result<PermissionKind, (StatusCode, String)> {
    name.parse()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, e))
}

fn authenticate(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<SignedRequest, (StatusCode, String)> {
    signed_fetch::verify(method, uri.path(), headers, Utc::now())
        .map_err(|e| (StatusCode::UNAUTHORIZED, e))
}

/// Replace one permission of a world with the policy in the signed metadata
pub async fn post_permission(
    State(state): State<Arc<AppState>>,
    Path((world_name, permission_name)): Path<(String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    let kind = permission_kind(&permission_name)?;
    let signed = authenticate(&method, &uri, &headers)?;

    let policy = signed
        .metadata
        .get("type")
        .and_then(|policy| policy.as_str())
        .unwrap_or_default()
        .to_string();
    let request: SetPermissionRequest = serde_json::from_value(signed.metadata).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid payload received. Need to provide a valid permission type: {policy}."),
        )
    })?;

    state
        .permissions
        .set_permission(&signed.signer, &world_name, kind, request)
        .await
        .map_err(permissions_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn put_permission_address(
    State(state): State<Arc<AppState>>,
    Path((world_name, permission_name, address)): Path<(String, String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    let kind = permission_kind(&permission_name)?;
    let signed = authenticate(&method, &uri, &headers)?;

    state
        .permissions
        .add_address_to_allow_list(&signed.signer, &world_name, kind, &address)
        .await
        .map_err(permissions_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_permission_address(
    State(state): State<Arc<AppState>>,
    Path((world_name, permission_name, address)): Path<(String, String, String)>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Result<StatusCode, (StatusCode, String)> {
    let kind = permission_kind(&permission_name)?;
    let signed = authenticate(&method, &uri, &headers)?;

    state
        .permissions
        .delete_address_from_allow_list(&signed.signer, &world_name, kind, &address)
        .await
        .map_err(permissions_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deployment allow list of a world
pub async fn get_acl(
    State(state): State<Arc<AppState>>,
    Path(world_name): Path<String>,
) -> Result<Json<AccessControlList>, (StatusCode, String)> {
    let acl = state
        .permissions
        .get_acl(&world_name)
        .await
        .map_err(permissions_error)?;
    Ok(Json(acl))
}

/// Replace the deployment allow list. The body is an auth chain whose last
/// link signs the ACL JSON.
pub async fn post_acl(
    State(state): State<Arc<AppState>>,
    Path(world_name): Path<String>,
    body: String,
) -> Result<Json<AccessControlList>, (StatusCode, String)> {
    let invalid_chain = || {
        (
            StatusCode::BAD_REQUEST,
            "Invalid payload received. Need to be a valid AuthChain.".to_string(),
        )
    };
    let chain: AuthChain = serde_json::from_str(&body).map_err(|_| invalid_chain())?;
    let signed_acl = chain.links().last().ok_or_else(invalid_chain)?.payload.clone();

    let now = Utc::now();
    let signer = verify_signed_payload(&signed_acl, &chain, now)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e))?;
    let acl: AccessControlList = serde_json::from_str(&signed_acl).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            "Provided acl is invalid. allowed is missing or not an array of addresses.".to_string(),
        )
    })?;

    let acl = state
        .permissions
        .set_deployment_acl(&signer, &world_name, acl, now)
        .await
        .map_err(permissions_error)?;
    Ok(Json(acl))
}
