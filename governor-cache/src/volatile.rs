//! In-memory store backed by a lock-guarded map.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::store::IdempotencyStore;
use crate::CacheResult;

#[derive(Clone, Debug)]
struct CacheEntry {
    value: Value,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Process-local [`IdempotencyStore`] implementation.
///
/// Expired entries are dropped lazily on access; there is no sweeper task.
#[derive(Debug, Default)]
pub struct VolatileCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl VolatileCache {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now();
        let guard = self.entries.read().await;
        guard.values().filter(|entry| !entry.is_expired(now)).count()
    }

    /// Returns `true` when no live entries exist.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl IdempotencyStore for VolatileCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let now = Utc::now();
        {
            let guard = self.entries.read().await;
            match guard.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // The entry exists but lapsed; drop it under the write lock.
        let mut guard = self.entries.write().await;
        if guard.get(key).is_some_and(|entry| entry.is_expired(now)) {
            guard.remove(key);
            debug!(key, "expired cache entry dropped");
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()> {
        let expires_at = match ttl {
            Some(ttl) => Some(
                Utc::now()
                    + chrono::Duration::from_std(ttl)
                        .map_err(|err| crate::CacheError::backend(err.to_string()))?,
            ),
            None => None,
        };

        let mut guard = self.entries.write().await;
        guard.insert(key.to_owned(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &str) -> CacheResult<bool> {
        let mut guard = self.entries.write().await;
        Ok(guard.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn put_get_remove_round_trip() {
        let cache = VolatileCache::new();
        assert!(cache.is_empty().await);

        cache
            .put("agent-1-active-self", json!(true), None)
            .await
            .unwrap();
        assert!(cache.contains("agent-1-active-self").await.unwrap());
        assert_eq!(
            cache.get("agent-1-active-self").await.unwrap(),
            Some(json!(true))
        );

        assert!(cache.remove("agent-1-active-self").await.unwrap());
        assert!(!cache.remove("agent-1-active-self").await.unwrap());
        assert!(cache.get("agent-1-active-self").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_replaces_existing_entries() {
        let cache = VolatileCache::new();
        cache.put("key", json!("first"), None).await.unwrap();
        cache.put("key", json!("second"), None).await.unwrap();

        assert_eq!(cache.get("key").await.unwrap(), Some(json!("second")));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn expired_entries_read_as_missing() {
        let cache = VolatileCache::new();
        cache
            .put("ephemeral", json!(1), Some(Duration::from_nanos(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(!cache.contains("ephemeral").await.unwrap());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn entries_without_ttl_persist() {
        let cache = VolatileCache::new();
        cache.put("durable", json!(1), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(cache.contains("durable").await.unwrap());
    }
}
