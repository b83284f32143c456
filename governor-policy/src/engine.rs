//! Permission engine bound to a single governance profile.

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, warn};

use governor_primitives::{Permission, WebhookEvent};

use crate::callbacks::{CallbackRegistration, WebhookCallback};
use crate::document::{EffectivePolicy, PolicyDocument};

/// Errors describing a governance refusal.
///
/// These are the named, diagnosable errors the webhook caller receives when
/// policy forbids an automatic action. They are never retried internally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    /// The topic/action pair resolves to `deny`.
    #[error("governance denied `{action}` on `{topic}`")]
    Denied {
        /// Policy topic that was consulted.
        topic: String,
        /// Action that was refused.
        action: String,
    },

    /// A `once` permission was already exercised for this exchange.
    #[error("`{action}` on `{topic}` already fulfilled for exchange `{key}`")]
    AlreadyFulfilled {
        /// Policy topic that was consulted.
        topic: String,
        /// Action that was refused.
        action: String,
        /// Idempotency key identifying the exchange.
        key: String,
    },
}

/// Governance engine for one policy profile.
///
/// Owns the flattened permission table and the callback list. The table is
/// the only mutable permission state: a concrete `once` cell flips to `deny`
/// the first time it is consumed through [`read_permission`]. All mutation
/// happens inside synchronous lock sections, never across an `.await`.
///
/// [`read_permission`]: Self::read_permission
pub struct GovernanceEngine {
    profile: String,
    policy: RwLock<EffectivePolicy>,
    callbacks: RwLock<Vec<CallbackRegistration>>,
}

impl GovernanceEngine {
    /// Builds an engine by flattening the named profile of a document.
    #[must_use]
    pub fn new(document: &PolicyDocument, profile: impl Into<String>) -> Self {
        let profile = profile.into();
        let policy = document.effective(&profile);
        Self {
            profile,
            policy: RwLock::new(policy),
            callbacks: RwLock::new(Vec::new()),
        }
    }

    /// Returns the profile name this engine is bound to.
    #[must_use]
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Returns `true` iff the value names a permission, case-insensitively.
    #[must_use]
    pub fn is_valid_value(value: &str) -> bool {
        value.parse::<Permission>().is_ok()
    }

    /// Read-only permission lookup.
    ///
    /// Resolution order: the exact `policy[topic][action]` cell, falling back
    /// to the `all` permission when the topic or action is absent (a lookup
    /// of the `all` topic itself also resolves through the fallback). Never
    /// fails and never mutates the table.
    ///
    /// # Panics
    ///
    /// Panics if the policy table lock has been poisoned.
    #[must_use]
    pub fn peek_permission(&self, topic: &str, action: &str) -> Permission {
        let guard = self.policy.read().expect("policy table poisoned");
        guard.lookup(topic, action).permission()
    }

    /// Consuming permission lookup.
    ///
    /// Same resolution as [`peek_permission`](Self::peek_permission), except
    /// that a concretely matched cell storing exactly `once` is rewritten to
    /// `deny` as part of the call. Fallback hits on `all` never consume it.
    ///
    /// # Panics
    ///
    /// Panics if the policy table lock has been poisoned.
    #[must_use]
    pub fn read_permission(&self, topic: &str, action: &str) -> Permission {
        let mut guard = self.policy.write().expect("policy table poisoned");
        let permission = guard.consume(topic, action);
        if permission == Permission::Once {
            debug!(
                profile = self.profile,
                topic, action, "single-use permission consumed"
            );
        }
        permission
    }

    /// Registers a callback for a topic, or updates an existing one.
    ///
    /// When the id is already present the entry is replaced in place at its
    /// existing list position; otherwise the registration is appended. All
    /// registrations whose topic matches an invoked delivery run, in
    /// registration order.
    ///
    /// # Panics
    ///
    /// Panics if the callback registry lock has been poisoned.
    pub fn register_callback<C>(&self, id: impl Into<String>, topic: impl Into<String>, callback: C)
    where
        C: WebhookCallback + 'static,
    {
        let id = id.into();
        let topic = topic.into();
        let callback: Arc<dyn WebhookCallback> = Arc::new(callback);

        let mut guard = self.callbacks.write().expect("callback registry poisoned");
        if let Some(existing) = guard.iter_mut().find(|entry| entry.id() == id) {
            debug!(profile = self.profile, id, topic, "callback re-registered");
            existing.replace(topic, callback);
        } else {
            debug!(profile = self.profile, id, topic, "callback registered");
            guard.push(CallbackRegistration::new(id, topic, callback));
        }
    }

    /// Invokes every registration whose topic equals the event's topic.
    ///
    /// Callbacks run sequentially in registration order; a slow callback
    /// delays the rest for this delivery only. Returns `true` iff at least
    /// one callback returned exactly `true`. A failing callback is isolated:
    /// its error is logged, its failure count incremented, and the remaining
    /// callbacks still run.
    ///
    /// # Panics
    ///
    /// Panics if the callback registry lock has been poisoned.
    pub async fn invoke_callbacks(&self, event: &WebhookEvent) -> bool {
        let matching: Vec<(String, Arc<dyn WebhookCallback>)> = {
            let guard = self.callbacks.read().expect("callback registry poisoned");
            guard
                .iter()
                .filter(|entry| entry.topic() == event.topic())
                .map(|entry| (entry.id().to_owned(), entry.callback()))
                .collect()
        };

        let mut handled = false;
        for (id, callback) in matching {
            match callback.intercept(event.clone()).await {
                Ok(true) => {
                    debug!(
                        profile = self.profile,
                        callback = id,
                        topic = event.topic(),
                        "callback handled delivery"
                    );
                    handled = true;
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        profile = self.profile,
                        callback = id,
                        topic = event.topic(),
                        error = %err,
                        "callback failed, continuing with remaining callbacks"
                    );
                    self.record_failure(&id);
                }
            }
        }
        handled
    }

    /// Returns a snapshot of the callback list for inspection.
    ///
    /// # Panics
    ///
    /// Panics if the callback registry lock has been poisoned.
    #[must_use]
    pub fn callback_registrations(&self) -> Vec<CallbackRegistration> {
        self.callbacks
            .read()
            .expect("callback registry poisoned")
            .clone()
    }

    fn record_failure(&self, id: &str) {
        let mut guard = self.callbacks.write().expect("callback registry poisoned");
        if let Some(entry) = guard.iter_mut().find(|entry| entry.id() == id) {
            entry.record_failure();
        }
    }
}

impl std::fmt::Debug for GovernanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceEngine")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}
