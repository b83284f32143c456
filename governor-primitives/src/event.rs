//! Webhook payload shared between the kernel and registered callbacks.

use std::sync::Arc;

use serde_json::Value;

use crate::AgentId;

/// One webhook delivery as seen by topic handlers and callbacks.
///
/// The body stays a shared [`Value`] so callbacks and handlers can inspect it
/// without cloning the whole payload per registration.
#[derive(Clone, Debug)]
pub struct WebhookEvent {
    agent_id: AgentId,
    route: String,
    topic: String,
    body: Arc<Value>,
    token: Option<String>,
}

impl WebhookEvent {
    /// Builds an event from the inbound webhook parts.
    #[must_use]
    pub fn new(
        agent_id: AgentId,
        route: impl Into<String>,
        topic: impl Into<String>,
        body: Value,
        token: Option<String>,
    ) -> Self {
        Self {
            agent_id,
            route: route.into(),
            topic: topic.into(),
            body: Arc::new(body),
            token,
        }
    }

    /// Returns the tenant agent the delivery belongs to.
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the route segment, conventionally the literal `topic`.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Returns the raw topic string as delivered by the agent.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the webhook body.
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Returns a cheap shared handle to the body.
    #[must_use]
    pub fn shared_body(&self) -> Arc<Value> {
        Arc::clone(&self.body)
    }

    /// Returns the bearer token for multi-tenant agents, when present.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
