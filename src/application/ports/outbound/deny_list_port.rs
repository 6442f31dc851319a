//! Banned names port - source of the world name deny list

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum DenyListError {
    #[error("Failed to fetch banned names: {0}")]
    Fetch(String),
}

#[async_trait]
pub trait BannedNamesPort: Send + Sync {
    /// Banned names, without the `.dcl.eth` suffix
    async fn fetch_banned_names(&self) -> Result<Vec<String>, DenyListError>;
}
