//! Per-delivery context handed to the dispatcher and handlers.

use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use governor_primitives::{AgentId, WebhookEvent};

/// One webhook delivery plus kernel-side correlation metadata.
///
/// The delivery id ties together every log line a single webhook produces
/// across the dispatcher, handlers, and admin calls.
#[derive(Clone, Debug)]
pub struct WebhookContext {
    delivery_id: Uuid,
    received_at: Instant,
    event: WebhookEvent,
}

impl WebhookContext {
    /// Wraps an inbound event in a fresh delivery context.
    #[must_use]
    pub fn new(event: WebhookEvent) -> Self {
        Self {
            delivery_id: Uuid::new_v4(),
            received_at: Instant::now(),
            event,
        }
    }

    /// Returns the delivery correlation id.
    #[must_use]
    pub const fn delivery_id(&self) -> Uuid {
        self.delivery_id
    }

    /// Returns the time the webhook entered the kernel.
    #[must_use]
    pub const fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Returns the underlying event.
    #[must_use]
    pub fn event(&self) -> &WebhookEvent {
        &self.event
    }

    /// Returns the tenant agent the delivery belongs to.
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        self.event.agent_id()
    }

    /// Returns the route segment of the delivery.
    #[must_use]
    pub fn route(&self) -> &str {
        self.event.route()
    }

    /// Returns the raw topic string of the delivery.
    #[must_use]
    pub fn topic(&self) -> &str {
        self.event.topic()
    }

    /// Returns the webhook body.
    #[must_use]
    pub fn body(&self) -> &Value {
        self.event.body()
    }

    /// Returns the tenant bearer token, when present.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.event.token()
    }
}
