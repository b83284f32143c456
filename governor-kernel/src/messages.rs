//! Problem-report, basic-message, and no-op topic handlers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use governor_cache::IdempotencyStore;
use governor_policy::{GovernanceEngine, GovernanceError};
use governor_primitives::WebhookTopic;

use crate::context::WebhookContext;
use crate::error::HandlerResult;
use crate::handler::{acknowledged, ensure_delivery, TopicHandler};

/// Observes problem reports raised by either party of an exchange.
///
/// Reports are always accepted and logged; policy never gates observation,
/// only follow-up actions. When the report carries a thread reference and a
/// description, the description is parked in the cache so the flow that
/// owns the thread can later detect its exchange failed.
pub struct ProblemReportHandler {
    engine: Arc<GovernanceEngine>,
    cache: Arc<dyn IdempotencyStore>,
}

impl ProblemReportHandler {
    /// Creates a handler over the shared collaborators.
    #[must_use]
    pub fn new(engine: Arc<GovernanceEngine>, cache: Arc<dyn IdempotencyStore>) -> Self {
        Self { engine, cache }
    }
}

#[async_trait]
impl TopicHandler for ProblemReportHandler {
    async fn handle(&self, ctx: &WebhookContext) -> HandlerResult {
        ensure_delivery(ctx, WebhookTopic::ProblemReport)?;

        warn!(
            agent = %ctx.agent_id(),
            report = %ctx.body(),
            "problem report received"
        );

        if self.engine.invoke_callbacks(ctx.event()).await {
            return Ok(acknowledged("delivery handled by registered callback"));
        }

        let thread_id = ctx.body()["~thread"]["thid"].as_str();
        let description = ctx.body()["description"].as_str();
        if let (Some(thread_id), Some(description)) = (thread_id, description) {
            self.cache
                .put(thread_id, json!(description), None)
                .await?;
            debug!(thread = thread_id, "problem report description cached");
        }

        Ok(acknowledged("problem report logged"))
    }
}

/// Coarsely-gated pass-through for basic messages.
///
/// There is no built-in protocol action for this topic; it exists so
/// external consumers can intercept messages. Policy is consulted at the
/// blanket `all` action before any callback runs.
pub struct BasicMessageHandler {
    engine: Arc<GovernanceEngine>,
}

impl BasicMessageHandler {
    /// Creates a handler over the shared engine.
    #[must_use]
    pub fn new(engine: Arc<GovernanceEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl TopicHandler for BasicMessageHandler {
    async fn handle(&self, ctx: &WebhookContext) -> HandlerResult {
        ensure_delivery(ctx, WebhookTopic::Basicmessages)?;

        let policy_topic = WebhookTopic::Basicmessages.policy_key();
        if self.engine.read_permission(policy_topic, "all").is_deny() {
            return Err(GovernanceError::Denied {
                topic: policy_topic.to_owned(),
                action: "all".to_owned(),
            }
            .into());
        }

        let handled = self.engine.invoke_callbacks(ctx.event()).await;
        Ok(json!({ "success": true, "handled": handled }))
    }
}

/// Acknowledges topics that never require automatic protocol advancement.
pub struct NoopHandler {
    topic: WebhookTopic,
}

impl NoopHandler {
    /// Creates a handler acknowledging the supplied topic.
    #[must_use]
    pub const fn new(topic: WebhookTopic) -> Self {
        Self { topic }
    }
}

#[async_trait]
impl TopicHandler for NoopHandler {
    async fn handle(&self, ctx: &WebhookContext) -> HandlerResult {
        debug!(
            agent = %ctx.agent_id(),
            topic = %self.topic,
            "no automatic handling for topic"
        );
        Ok(acknowledged("no action taken"))
    }
}
