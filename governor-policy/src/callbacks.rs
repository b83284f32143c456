//! Pluggable webhook callbacks invoked before built-in topic handling.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use governor_primitives::WebhookEvent;

/// Result returned by a callback; `Ok(true)` means the callback fully
/// handled the delivery and built-in logic must not run.
pub type CallbackResult = Result<bool, CallbackError>;

/// Error raised by a registered callback.
///
/// Callback failures are isolated per registration: the engine logs them,
/// bumps the registration's failure count, and keeps invoking the rest.
#[derive(Debug, Error)]
#[error("callback failed: {reason}")]
pub struct CallbackError {
    reason: String,
}

impl CallbackError {
    /// Creates an error from a string-like reason.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Trait implemented by webhook interceptors.
#[async_trait]
pub trait WebhookCallback: Send + Sync {
    /// Inspects a delivery before built-in handling runs.
    async fn intercept(&self, event: WebhookEvent) -> CallbackResult;
}

#[async_trait]
impl<F, Fut> WebhookCallback for F
where
    F: Send + Sync + Fn(WebhookEvent) -> Fut,
    Fut: Future<Output = CallbackResult> + Send,
{
    async fn intercept(&self, event: WebhookEvent) -> CallbackResult {
        (self)(event).await
    }
}

/// One entry in an engine's callback list.
#[derive(Clone)]
pub struct CallbackRegistration {
    id: String,
    topic: String,
    callback: Arc<dyn WebhookCallback>,
    failure_count: u32,
}

impl CallbackRegistration {
    pub(crate) fn new(id: String, topic: String, callback: Arc<dyn WebhookCallback>) -> Self {
        Self {
            id,
            topic,
            callback,
            failure_count: 0,
        }
    }

    /// Re-points an existing registration at a new topic and callback.
    ///
    /// The entry keeps its list position; the failure count restarts since
    /// the previous callback's failures say nothing about the new one.
    pub(crate) fn replace(&mut self, topic: String, callback: Arc<dyn WebhookCallback>) {
        self.topic = topic;
        self.callback = callback;
        self.failure_count = 0;
    }

    pub(crate) fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
    }

    pub(crate) fn callback(&self) -> Arc<dyn WebhookCallback> {
        Arc::clone(&self.callback)
    }

    /// Returns the caller-chosen registration id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the topic this registration listens on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns how many times the callback has failed since registration.
    #[must_use]
    pub const fn failure_count(&self) -> u32 {
        self.failure_count
    }
}

impl std::fmt::Debug for CallbackRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistration")
            .field("id", &self.id)
            .field("topic", &self.topic)
            .field("failure_count", &self.failure_count)
            .finish_non_exhaustive()
    }
}
