use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::outbound::{NameOwnershipError, NameOwnershipPort};
use crate::application::services::cache::TtlCache;
use crate::domain::value_objects::EthAddress;

const MAX_ENTRIES: usize = 100;
const TTL: Duration = Duration::from_secs(60);

/// Caches owner lookups by lower-cased name, including "no owner" answers
pub struct CachingNameOwnership {
    inner: Arc<dyn NameOwnershipPort>,
    cache: TtlCache<String, Option<EthAddress>>,
}

impl CachingNameOwnership {
    pub fn new(inner: Arc<dyn NameOwnershipPort>) -> Self {
        Self::with_cache(inner, TtlCache::new(MAX_ENTRIES, TTL))
    }

    pub fn with_cache(
        inner: Arc<dyn NameOwnershipPort>,
        cache: TtlCache<String, Option<EthAddress>>,
    ) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl NameOwnershipPort for CachingNameOwnership {
    async fn find_owner(&self, name: &str) -> Result<Option<EthAddress>, NameOwnershipError> {
        let key = name.to_lowercase();
        self.cache
            .get_or_fetch(key.clone(), || self.inner.find_owner(&key))
            .await
    }
}
