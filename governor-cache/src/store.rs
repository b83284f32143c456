//! Storage contract for idempotency marks and exchange metadata.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::CacheResult;

/// Async key-value store with optional per-entry TTL.
///
/// Implementations must make `put` effectively atomic per key; the
/// check-then-mark sequence in the exchange guard relies on it. A networked
/// implementation (shared across controller processes) satisfies the same
/// contract.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    /// Returns the value stored under `key`, if present and not expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous entry. A `ttl` of
    /// `None` keeps the entry until explicitly removed.
    async fn put(&self, key: &str, value: Value, ttl: Option<Duration>) -> CacheResult<()>;

    /// Removes the entry under `key`, reporting whether one existed.
    async fn remove(&self, key: &str) -> CacheResult<bool>;

    /// Returns `true` when a live entry exists under `key`.
    async fn contains(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
