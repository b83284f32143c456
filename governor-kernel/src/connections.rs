//! Connection-establishment topic handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use governor_adapters::traits::AdminApi;
use governor_cache::IdempotencyStore;
use governor_policy::GovernanceEngine;
use governor_primitives::WebhookTopic;

use crate::context::WebhookContext;
use crate::error::HandlerResult;
use crate::guard::ExchangeGuard;
use crate::handler::{acknowledged, ensure_delivery, TopicHandler};

/// Policy topic consulted for connection actions.
const POLICY_TOPIC: &str = "connections";

#[derive(Debug, Default, Deserialize)]
struct ConnectionRecord {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    rfc23_state: Option<String>,
    #[serde(default)]
    initiator: Option<String>,
    #[serde(default)]
    connection_id: Option<String>,
}

/// Governs the connection-establishment exchange.
///
/// `invitation-received` advances via `accept-invitation`,
/// `request-received` via `accept-request`; every other state is observed
/// and acknowledged without action.
pub struct ConnectionsHandler {
    engine: Arc<GovernanceEngine>,
    admin: Arc<dyn AdminApi>,
    guard: ExchangeGuard,
}

impl ConnectionsHandler {
    /// Creates a handler over the shared collaborators.
    #[must_use]
    pub fn new(
        engine: Arc<GovernanceEngine>,
        cache: Arc<dyn IdempotencyStore>,
        admin: Arc<dyn AdminApi>,
    ) -> Self {
        Self {
            guard: ExchangeGuard::new(Arc::clone(&engine), cache),
            engine,
            admin,
        }
    }
}

#[async_trait]
impl TopicHandler for ConnectionsHandler {
    async fn handle(&self, ctx: &WebhookContext) -> HandlerResult {
        ensure_delivery(ctx, WebhookTopic::Connections)?;

        if self.engine.invoke_callbacks(ctx.event()).await {
            return Ok(acknowledged("delivery handled by registered callback"));
        }

        let record = ConnectionRecord::deserialize(ctx.body()).unwrap_or_default();
        let action = match record.rfc23_state.as_deref() {
            Some("invitation-received") => "accept-invitation",
            Some("request-received") => "accept-request",
            state => {
                debug!(
                    agent = %ctx.agent_id(),
                    state = state.unwrap_or("<missing>"),
                    "no automatic action for connection state"
                );
                return Ok(acknowledged("no action for connection state"));
            }
        };

        let Some(connection_id) = record.connection_id.as_deref() else {
            debug!(agent = %ctx.agent_id(), action, "connection record carries no id");
            return Ok(acknowledged("no action for connection state"));
        };

        let key = format!(
            "{}-{}-{}",
            ctx.agent_id(),
            record.state.as_deref().unwrap_or_default(),
            record.initiator.as_deref().unwrap_or_default(),
        );
        self.guard.enforce(POLICY_TOPIC, action, &key).await?;

        let response = self
            .admin
            .connection_action(connection_id, action, ctx.token())
            .await?;
        Ok(response)
    }
}
