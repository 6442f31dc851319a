//! World name deny list

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::cache::TtlCache;
use crate::application::ports::outbound::{BannedNamesPort, DenyListError};

const REFRESH_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Banned names fetched from an external list, refreshed hourly. Without a
/// source nothing is banned.
pub struct NameDenyList {
    source: Option<Arc<dyn BannedNamesPort>>,
    cache: TtlCache<(), Arc<Vec<String>>>,
}

impl NameDenyList {
    pub fn new(source: Option<Arc<dyn BannedNamesPort>>) -> Self {
        match &source {
            Some(_) => info!("Using name deny list"),
            None => info!("No name deny list configured"),
        }
        Self {
            source,
            cache: TtlCache::new(1, REFRESH_INTERVAL),
        }
    }

    pub fn disabled() -> Self {
        Self::new(None)
    }

    async fn banned_names(&self) -> Result<Arc<Vec<String>>, DenyListError> {
        let Some(source) = &self.source else {
            return Ok(Arc::default());
        };
        self.cache
            .get_or_fetch((), || async {
                let names = source.fetch_banned_names().await?;
                Ok::<_, DenyListError>(Arc::new(
                    names.into_iter().map(|name| name.to_lowercase()).collect(),
                ))
            })
            .await
    }

    /// `false` when the world name is banned
    pub async fn is_allowed(&self, world_name: &str) -> Result<bool, DenyListError> {
        let name = world_name.to_lowercase();
        let label = name.strip_suffix(".dcl.eth").unwrap_or(&name);

        let banned = self.banned_names().await?.iter().any(|banned| banned == label);
        if banned {
            warn!(world = %world_name, "Name is banned");
        }
        Ok(!banned)
    }
}
