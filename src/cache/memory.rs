//! In-memory cache implementation using moka
//!
//! Thread-safe cache with TTL expiration and glob-style pattern deletion.
//! Values are stored as JSON strings to support generic types.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// Default TTL for cache entries (1 hour)
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Cache entry wrapper storing serialized JSON data
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    default_ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache with default settings
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a new memory cache with custom capacity and TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, default_ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(default_ttl)
            .support_invalidation_closures()
            .build();

        Self { cache, default_ttl }
    }

    /// Get the default TTL for this cache
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get the current number of entries in the cache
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Check if a glob pattern matches a key.
    ///
    /// `*` matches any sequence of characters, `?` matches a single
    /// character.
    fn pattern_matches(pattern: &str, key: &str) -> bool {
        let pattern_chars: Vec<char> = pattern.chars().collect();
        let key_chars: Vec<char> = key.chars().collect();
        Self::glob_match(&pattern_chars, &key_chars, 0, 0)
    }

    fn glob_match(pattern: &[char], key: &[char], pi: usize, ki: usize) -> bool {
        if pi == pattern.len() {
            return ki == key.len();
        }

        match pattern[pi] {
            '*' => {
                // Zero characters, then one or more
                if Self::glob_match(pattern, key, pi + 1, ki) {
                    return true;
                }
                ki < key.len() && Self::glob_match(pattern, key, pi, ki + 1)
            }
            '?' => ki < key.len() && Self::glob_match(pattern, key, pi + 1, ki + 1),
            p => ki < key.len() && key[ki] == p && Self::glob_match(pattern, key, pi + 1, ki + 1),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => {
                let value = entry.deserialize()?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Set a value in cache.
    ///
    /// Expiration is governed by the cache-wide time_to_live; moka's basic
    /// insert has no per-entry TTL, so `ttl` acts as an upper bound only.
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        let entry = CacheEntry::new(value)?;
        self.cache.insert(key.to_string(), entry).await;
        let _ = ttl;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        // Requires a full key scan; cache sizes here are small
        let keys_to_delete: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| Self::pattern_matches(pattern, key.as_ref()))
            .map(|(key, _)| (*key).clone())
            .collect();

        for key in keys_to_delete {
            self.cache.invalidate(&key).await;
        }

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = MemoryCache::new();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let cache = MemoryCache::new();

        let result: Option<String> = cache.get("nonexistent").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete() {
        let cache = MemoryCache::new();

        cache
            .set("key1", &"value1".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        cache.delete("key1").await.unwrap();

        let result: Option<String> = cache.get("key1").await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_delete_pattern() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        cache.set("products:1", &"a".to_string(), ttl).await.unwrap();
        cache.set("products:2", &"b".to_string(), ttl).await.unwrap();
        cache
            .set("categories:product:tree", &"c".to_string(), ttl)
            .await
            .unwrap();

        cache.delete_pattern("products:*").await.unwrap();

        let p1: Option<String> = cache.get("products:1").await.unwrap();
        let p2: Option<String> = cache.get("products:2").await.unwrap();
        let tree: Option<String> = cache.get("categories:product:tree").await.unwrap();

        assert_eq!(p1, None);
        assert_eq!(p2, None);
        assert_eq!(tree, Some("c".to_string()));
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        cache.set("key1", &"value1".to_string(), ttl).await.unwrap();
        cache.set("key2", &"value2".to_string(), ttl).await.unwrap();

        cache.clear().await.unwrap();

        let result1: Option<String> = cache.get("key1").await.unwrap();
        let result2: Option<String> = cache.get("key2").await.unwrap();

        assert_eq!(result1, None);
        assert_eq!(result2, None);
    }

    #[tokio::test]
    async fn test_complex_types() {
        let cache = MemoryCache::new();

        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Item {
            id: i64,
            name: String,
        }

        let item = Item {
            id: 1,
            name: "Beras Organik".to_string(),
        };

        cache
            .set("products:1", &item, Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<Item> = cache.get("products:1").await.unwrap();
        assert_eq!(result, Some(item));
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let cache = MemoryCache::with_capacity_and_ttl(100, Duration::from_millis(10));

        cache
            .set("key", &"value".to_string(), Duration::from_millis(10))
            .await
            .unwrap();
        let before: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(before, Some("value".to_string()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.cache.run_pending_tasks().await;

        let after: Option<String> = cache.get("key").await.unwrap();
        assert_eq!(after, None);
    }

    #[test]
    fn test_pattern_matches() {
        assert!(MemoryCache::pattern_matches("products:*", "products:123"));
        assert!(MemoryCache::pattern_matches("products:*", "products:"));
        assert!(MemoryCache::pattern_matches("*", "anything"));
        assert!(!MemoryCache::pattern_matches("products:*", "posts:123"));

        assert!(MemoryCache::pattern_matches(
            "categories:?:tree",
            "categories:a:tree"
        ));
        assert!(!MemoryCache::pattern_matches(
            "categories:?:tree",
            "categories:ab:tree"
        ));

        assert!(MemoryCache::pattern_matches("exact", "exact"));
        assert!(!MemoryCache::pattern_matches("exact", "exactx"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            /// A key written under a prefix is always removed by deleting
            /// that prefix pattern, and keys under other prefixes survive.
            #[test]
            fn pattern_delete_respects_prefix(
                suffix in "[a-z0-9]{1,12}",
                value in "[a-z]{1,40}"
            ) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                rt.block_on(async {
                    let cache = MemoryCache::new();
                    let ttl = Duration::from_secs(60);

                    let target = format!("products:{}", suffix);
                    let other = format!("posts:{}", suffix);
                    cache.set(&target, &value, ttl).await.unwrap();
                    cache.set(&other, &value, ttl).await.unwrap();

                    cache.delete_pattern("products:*").await.unwrap();

                    let gone: Option<String> = cache.get(&target).await.unwrap();
                    let kept: Option<String> = cache.get(&other).await.unwrap();
                    prop_assert_eq!(gone, None);
                    prop_assert_eq!(kept, Some(value));
                    Ok(())
                })?;
            }
        }
    }
}
