//! Check/commit idempotency guard around governed actions.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use governor_cache::IdempotencyStore;
use governor_policy::{GovernanceError, GovernanceEngine};

use crate::error::HandlerResult;

/// Ties permission consumption to a per-exchange cache mark.
///
/// `check` peeks the permission and the cache without mutating either;
/// `commit` performs the consuming read (`once` → `deny`) and writes the
/// mark. The two calls span awaited cache operations, so two concurrent
/// deliveries for the same exchange key can both pass `check` before either
/// commits. Known limitation: the upstream agent serializes deliveries for
/// a single exchange in practice, and the permission-table mutation itself
/// is atomic under the engine lock.
pub struct ExchangeGuard {
    engine: Arc<GovernanceEngine>,
    cache: Arc<dyn IdempotencyStore>,
}

impl ExchangeGuard {
    /// Creates a guard over the shared engine and store.
    #[must_use]
    pub fn new(engine: Arc<GovernanceEngine>, cache: Arc<dyn IdempotencyStore>) -> Self {
        Self { engine, cache }
    }

    /// Verifies the action is currently permitted for this exchange.
    ///
    /// # Errors
    ///
    /// Returns [`GovernanceError::Denied`] when policy resolves to `deny`,
    /// [`GovernanceError::AlreadyFulfilled`] when a single-use permission
    /// was already exercised for `key`, and a cache error if the store
    /// fails.
    pub async fn check(&self, topic: &str, action: &str, key: &str) -> HandlerResult<()> {
        let permission = self.engine.peek_permission(topic, action);
        if permission.is_deny() {
            return Err(GovernanceError::Denied {
                topic: topic.to_owned(),
                action: action.to_owned(),
            }
            .into());
        }
        if permission.is_once() && self.cache.contains(key).await? {
            return Err(GovernanceError::AlreadyFulfilled {
                topic: topic.to_owned(),
                action: action.to_owned(),
                key: key.to_owned(),
            }
            .into());
        }
        Ok(())
    }

    /// Consumes the permission and marks the exchange as dispatched.
    ///
    /// # Errors
    ///
    /// Returns a cache error if writing the mark fails.
    pub async fn commit(&self, topic: &str, action: &str, key: &str) -> HandlerResult<()> {
        let permission = self.engine.read_permission(topic, action);
        self.cache.put(key, json!(true), None).await?;
        debug!(topic, action, key, %permission, "governed action committed");
        Ok(())
    }

    /// `check` followed immediately by `commit`.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`check`](Self::check) and
    /// [`commit`](Self::commit).
    pub async fn enforce(&self, topic: &str, action: &str, key: &str) -> HandlerResult<()> {
        self.check(topic, action, key).await?;
        self.commit(topic, action, key).await
    }
}
