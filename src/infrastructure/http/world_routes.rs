//! World API routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::application::dto::WorldsIndex;
use crate::domain::entities::WorldRuntimeMetadata;
use crate::domain::value_objects::PublicPermissions;
use crate::infrastructure::state::AppState;

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub permissions: PublicPermissions,
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Summary of every deployed world
pub async fn get_index(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WorldsIndex>, (StatusCode, String)> {
    let index = state.indexer.get_index().await.map_err(internal_error)?;
    Ok(Json(index))
}

/// Runtime metadata of the scene deployed to a world
pub async fn get_world_about(
    State(state): State<Arc<AppState>>,
    Path(world_name): Path<String>,
) -> Result<Json<WorldRuntimeMetadata>, (StatusCode, String)> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            format!("World \"{world_name}\" has no scene deployed."),
        )
    };

    let metadata = state
        .worlds
        .get_metadata_for_world(&world_name)
        .await
        .map_err(internal_error)?
        .filter(|metadata| metadata.has_deployment())
        .ok_or_else(not_found)?;

    metadata.runtime_metadata.map(Json).ok_or_else(not_found)
}

/// Permissions of a world with shared secrets removed
pub async fn get_world_permissions(
    State(state): State<Arc<AppState>>,
    Path(world_name): Path<String>,
) -> Result<Json<PermissionsResponse>, (StatusCode, String)> {
    let permissions = state
        .permissions
        .public_permissions(&world_name)
        .await
        .map_err(internal_error)?;

    Ok(Json(PermissionsResponse { permissions }))
}
