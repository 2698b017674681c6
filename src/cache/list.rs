//! Read-through cache slot for a whole list
//!
//! A write bumps the slot's generation before evicting, and a fill is only
//! kept when no write happened since its database read started. Without
//! that, a list read just before a concurrent create could be cached after
//! the create's eviction and stay stale for the full TTL.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::{Cache, CacheLayer};

pub struct CachedList<T> {
    cache: Arc<Cache>,
    namespace: &'static str,
    key: String,
    generation: AtomicU64,
    _value: PhantomData<fn() -> T>,
}

impl<T> CachedList<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Slot stored under `<namespace>:all`
    pub fn new(cache: Arc<Cache>, namespace: &'static str) -> Self {
        Self {
            cache,
            namespace,
            key: format!("{}:all", namespace),
            generation: AtomicU64::new(0),
            _value: PhantomData,
        }
    }

    /// Cached value, or the result of `load` stored for later calls
    pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.cache.get::<T>(&self.key).await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => tracing::warn!(key = %self.key, error = %e, "Cache read failed"),
        }

        let seen = self.generation.load(Ordering::Acquire);
        let value = load().await?;

        if self.generation.load(Ordering::Acquire) == seen {
            if let Err(e) = self.cache.set(&self.key, &value, Duration::ZERO).await {
                tracing::warn!(key = %self.key, error = %e, "Cache write failed");
            }
            // a write landed between the check and the store
            if self.generation.load(Ordering::Acquire) != seen {
                self.evict(&self.key).await;
            }
        }
        Ok(value)
    }

    /// Drop everything under the namespace; call after every write
    pub async fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let pattern = format!("{}:*", self.namespace);
        if let Err(e) = self.cache.delete_pattern(&pattern).await {
            tracing::warn!(pattern = %pattern, error = %e, "Cache invalidation failed");
        }
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Cache eviction failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use std::convert::Infallible;

    fn slot() -> CachedList<Vec<String>> {
        CachedList::new(Arc::new(MemoryCache::new()), "menu_categories")
    }

    #[tokio::test]
    async fn test_loads_once_then_serves_cache() {
        let list = slot();
        let first = list
            .get_or_load(|| async { Ok::<_, Infallible>(vec!["Main".to_string()]) })
            .await
            .unwrap();
        assert_eq!(first, vec!["Main".to_string()]);

        let cached = list
            .get_or_load(|| async { Ok::<_, Infallible>(vec!["changed".to_string()]) })
            .await
            .unwrap();
        assert_eq!(cached, first);

        list.invalidate().await;
        let reloaded = list
            .get_or_load(|| async { Ok::<_, Infallible>(vec!["changed".to_string()]) })
            .await
            .unwrap();
        assert_eq!(reloaded, vec!["changed".to_string()]);
    }

    #[tokio::test]
    async fn test_write_during_load_discards_stale_fill() {
        let list = slot();

        // the create commits and invalidates while the list query is in flight
        let stale = list
            .get_or_load(|| async {
                list.invalidate().await;
                Ok::<_, Infallible>(Vec::new())
            })
            .await
            .unwrap();
        assert!(stale.is_empty());

        let fresh = list
            .get_or_load(|| async { Ok::<_, Infallible>(vec!["Main".to_string()]) })
            .await
            .unwrap();
        assert_eq!(fresh, vec!["Main".to_string()]);
    }

    #[tokio::test]
    async fn test_load_errors_are_not_cached() {
        let list = slot();
        let err = list.get_or_load(|| async { Err::<Vec<String>, _>("db down") }).await;
        assert_eq!(err, Err("db down"));

        let value = list
            .get_or_load(|| async { Ok::<_, &str>(vec!["ok".to_string()]) })
            .await
            .unwrap();
        assert_eq!(value, vec!["ok".to_string()]);
    }
}
