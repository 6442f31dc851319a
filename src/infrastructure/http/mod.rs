//! HTTP REST API routes

mod entity_routes;
mod permission_routes;
mod signed_fetch;
mod world_routes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::infrastructure::state::AppState;

/// Room for the entity file and form fields on top of the content itself
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Create all API routes. Deployment bodies are capped at `max_size_mb` of
/// content.
pub fn create_routes(max_size_mb: u64) -> Router<Arc<AppState>> {
    let max_upload_bytes = (max_size_mb as usize)
        .saturating_mul(1024 * 1024)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(health_check))
        .route("/index", get(world_routes::get_index))
        .route(
            "/entities",
            post(entity_routes::deploy_entity).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/world/{name}/about", get(world_routes::get_world_about))
        .route(
            "/world/{name}/permissions",
            get(world_routes::get_world_permissions),
        )
        .route(
            "/world/{name}/permissions/{permission}",
            post(permission_routes::post_permission),
        )
        .route(
            "/world/{name}/permissions/{permission}/{address}",
            put(permission_routes::put_permission_address)
                .delete(permission_routes::delete_permission_address),
        )
        .route(
            "/acl/{name}",
            get(permission_routes::get_acl).post(permission_routes::post_acl),
        )
}

async fn health_check() -> &'static str {
    "OK"
}
