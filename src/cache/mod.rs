//! Cache layer
//!
//! Short-lived caching of hot, rarely-changing lists (the block and menu
//! category lists feed the admin sidebar on every navigation). Backed by an
//! in-process moka cache.
//!
//! ```rust,ignore
//! use orbit_admin::cache::{create_cache, CacheLayer};
//! use orbit_admin::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod list;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use list::CachedList;
pub use memory::MemoryCache;

/// Cache layer trait
///
/// The generic methods keep this trait from being object safe; services hold
/// the concrete `Cache` type instead.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}

/// Shared cache handle
pub type Cache = MemoryCache;

/// Create the shared cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig {
            max_capacity: 100,
            ttl_seconds: 1800,
        };
        let cache = create_cache(&config);

        assert_eq!(cache.default_ttl(), Duration::from_secs(1800));
        cache
            .set("test_key", &"test_value".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<String> = cache.get("test_key").await.unwrap();
        assert_eq!(result, Some("test_value".to_string()));
    }
}
