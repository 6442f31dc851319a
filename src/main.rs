//! Worlds Content Server - deployment validation and world permissions
//!
//! The server:
//! - Validates scene deployments into named worlds and stores their content
//! - Resolves world name ownership on-chain or through the marketplace subgraph
//! - Enforces deployment, access and streaming permissions per world

mod application;
mod domain;
mod infrastructure;
#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http;
use crate::infrastructure::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worlds_content_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Worlds Content Server");

    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Database: {}", config.database_url);
    tracing::info!("  Storage folder: {}", config.storage_folder);
    tracing::info!("  Name validator: {:?}", config.name_validator);
    tracing::info!("  ENS domains allowed: {}", config.allow_ens_domains);

    let port = config.server_port;
    let max_size_mb = config.max_size_mb;
    let state = Arc::new(AppState::new(config).await?);
    tracing::info!(
        deployed_worlds = state.worlds.get_deployed_world_count().await?,
        "Application state initialized"
    );

    let app = http::create_routes(max_size_mb)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(
                world_deployments = state.metrics.world_deployments(),
                "Shutdown signal received"
            );
        }
    }

    Ok(())
}
