//! Bounded TTL cache with least-recently-used eviction
//!
//! Caches are created once at startup and injected where needed. A refresh
//! that fails serves the last known value when there is one; only a cold
//! miss propagates the error.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone)]
struct CachedValue<V> {
    value: V,
    fetched_at: Instant,
    last_used: Instant,
}

pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, CachedValue<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Fresh value for `key`, calling `fetch` on a miss or after expiry.
    ///
    /// The lock is not held while fetching, so concurrent misses on the same
    /// key may fetch twice; the last result wins.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: std::fmt::Display,
    {
        let stale = {
            let mut entries = self.entries.lock().await;
            match entries.get_mut(&key) {
                Some(cached) => {
                    cached.last_used = Instant::now();
                    if cached.fetched_at.elapsed() < self.ttl {
                        return Ok(cached.value.clone());
                    }
                    Some(cached.value.clone())
                }
                None => None,
            }
        };

        match fetch().await {
            Ok(value) => {
                self.insert(key, value.clone()).await;
                Ok(value)
            }
            Err(e) => match stale {
                Some(value) => {
                    warn!(key = ?key, error = %e, "Cache refresh failed, serving stale value");
                    Ok(value)
                }
                None => Err(e),
            },
        }
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, cached)| cached.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        let now = Instant::now();
        entries.insert(
            key,
            CachedValue {
                value,
                fetched_at: now,
                last_used: now,
            },
        );
    }

    pub async fn invalidate(&self, key: &K) {
        self.entries.lock().await.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_fresh_value_is_served_from_cache() {
        let cache = TtlCache::new(10, Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_fetch("a".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>(42)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_value_is_refetched() {
        let cache = TtlCache::new(10, Duration::ZERO);
        cache.insert("a".to_string(), 1).await;

        let value = cache
            .get_or_fetch("a".to_string(), || async { Ok::<_, String>(2) })
            .await
            .unwrap();

        assert_eq!(value, 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_value() {
        let cache = TtlCache::new(10, Duration::ZERO);
        cache.insert("a".to_string(), 1).await;

        let value = cache
            .get_or_fetch("a".to_string(), || async { Err::<i32, _>("unreachable".to_string()) })
            .await
            .unwrap();

        assert_eq!(value, 1);
    }

    #[tokio::test]
    async fn test_cold_miss_propagates_error() {
        let cache: TtlCache<String, i32> = TtlCache::new(10, Duration::from_secs(60));

        let result = cache
            .get_or_fetch("a".to_string(), || async { Err::<i32, _>("unreachable".to_string()) })
            .await;

        assert_eq!(result, Err("unreachable".to_string()));
    }

    #[tokio::test]
    async fn test_least_recently_used_entry_is_evicted() {
        let cache = TtlCache::new(2, Duration::from_secs(60));
        cache.insert("a".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert("b".to_string(), 2).await;
        tokio::time::sleep(Duration::from_millis(2)).await;

        // touch "a" so "b" becomes the eviction candidate
        cache
            .get_or_fetch("a".to_string(), || async { Ok::<_, String>(0) })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        cache.insert("c".to_string(), 3).await;

        assert_eq!(cache.len().await, 2);
        let b = cache
            .get_or_fetch("b".to_string(), || async { Ok::<_, String>(20) })
            .await
            .unwrap();
        assert_eq!(b, 20);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let cache = TtlCache::new(10, Duration::from_secs(60));
        cache.insert("a".to_string(), 1).await;
        cache.invalidate(&"a".to_string()).await;

        let value = cache
            .get_or_fetch("a".to_string(), || async { Ok::<_, String>(5) })
            .await
            .unwrap();

        assert_eq!(value, 5);
    }
}
