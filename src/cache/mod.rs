//! Cache layer
//!
//! In-memory cache (moka) used by the services for list and detail
//! results. Entries are JSON-serialized with a per-entry TTL; every
//! write path invalidates the affected key prefixes explicitly.

use anyhow::{Context, Result};
use moka::future::Cache as MokaCache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::CacheConfig;

/// A serialized cache entry with its own expiry.
///
/// moka's time_to_live is cache-wide; per-entry TTL is tracked here
/// and checked on read.
#[derive(Clone)]
struct CacheEntry {
    payload: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T, ttl: Duration) -> Result<Self> {
        Ok(Self {
            payload: serde_json::to_string(value).context("Failed to serialize cache entry")?,
            expires_at: Instant::now() + ttl,
        })
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory cache using moka
pub struct Cache {
    inner: MokaCache<String, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("entry_count", &self.inner.entry_count())
            .finish()
    }
}

impl Cache {
    /// Create a cache with the given capacity and default TTL
    pub fn new(capacity: u64, default_ttl: Duration) -> Self {
        Self {
            inner: MokaCache::builder().max_capacity(capacity).build(),
            default_ttl,
        }
    }

    /// Default TTL used by `set`
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get a value from cache; expired entries read as misses
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entry = self.inner.get(key).await?;
        if entry.is_expired() {
            self.inner.invalidate(key).await;
            return None;
        }
        serde_json::from_str(&entry.payload).ok()
    }

    /// Set a value with the default TTL.
    ///
    /// A value that fails to serialize is skipped with a warning; the
    /// cache is an accelerator, not a source of truth.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Set a value with an explicit TTL
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match CacheEntry::new(value, ttl) {
            Ok(entry) => self.inner.insert(key.to_string(), entry).await,
            Err(e) => tracing::warn!("Skipping cache write for {key}: {e}"),
        }
    }

    /// Delete a single key
    pub async fn delete(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// Delete every key starting with the given prefix
    pub async fn delete_prefix(&self, prefix: &str) {
        // iter() only sees entries whose writes have been applied
        self.inner.run_pending_tasks().await;
        let keys: Vec<String> = self
            .inner
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| (*k).clone())
            .collect();

        for key in keys {
            self.inner.invalidate(&key).await;
        }
    }

    /// Clear all entries
    pub async fn clear(&self) {
        self.inner.invalidate_all();
    }
}

/// Create a cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<Cache> {
    Arc::new(Cache::new(
        config.capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cache() -> Cache {
        Cache::new(100, Duration::from_secs(60))
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = test_cache();
        cache.set("key", &42i64).await;
        assert_eq!(cache.get::<i64>("key").await, Some(42));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = test_cache();
        assert_eq!(cache.get::<String>("missing").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let cache = test_cache();
        cache
            .set_with_ttl("key", &"value", Duration::from_millis(10))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get::<String>("key").await, None);
    }

    #[tokio::test]
    async fn test_delete_prefix() {
        let cache = test_cache();
        cache.set("publications:list:1", &1i64).await;
        cache.set("publications:list:2", &2i64).await;
        cache.set("reports:list:1", &3i64).await;

        cache.delete_prefix("publications:").await;

        assert_eq!(cache.get::<i64>("publications:list:1").await, None);
        assert_eq!(cache.get::<i64>("publications:list:2").await, None);
        assert_eq!(cache.get::<i64>("reports:list:1").await, Some(3));
    }
}
