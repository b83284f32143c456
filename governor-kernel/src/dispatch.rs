//! Topic-to-handler selection for inbound webhooks.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use governor_adapters::traits::AdminApi;
use governor_cache::IdempotencyStore;
use governor_policy::GovernanceEngine;
use governor_primitives::{AgentId, WebhookEvent, WebhookTopic};

use crate::connections::ConnectionsHandler;
use crate::context::WebhookContext;
use crate::credentials::IssueCredentialHandler;
use crate::error::{HandlerError, HandlerResult};
use crate::handler::TopicHandler;
use crate::messages::{BasicMessageHandler, NoopHandler, ProblemReportHandler};
use crate::proofs::PresentProofHandler;

/// Routes each webhook delivery to the handler owning its topic.
///
/// Handlers are built fresh per dispatch so no handler-side state leaks
/// between unrelated webhooks; the engine, store, and admin client are the
/// only shared collaborators. Construct one dispatcher at startup and hand
/// it to the delivery framework.
pub struct Dispatcher {
    engine: Arc<GovernanceEngine>,
    cache: Arc<dyn IdempotencyStore>,
    admin: Arc<dyn AdminApi>,
}

impl Dispatcher {
    /// Creates a dispatcher over the shared collaborators.
    #[must_use]
    pub fn new(
        engine: Arc<GovernanceEngine>,
        cache: Arc<dyn IdempotencyStore>,
        admin: Arc<dyn AdminApi>,
    ) -> Self {
        Self {
            engine,
            cache,
            admin,
        }
    }

    /// Returns the governance engine deliveries are evaluated against.
    #[must_use]
    pub fn engine(&self) -> &Arc<GovernanceEngine> {
        &self.engine
    }

    /// Handles one inbound webhook end to end.
    ///
    /// Convenience wrapper building the [`WebhookContext`] from raw parts.
    ///
    /// # Errors
    ///
    /// Propagates every error of [`dispatch`](Self::dispatch).
    pub async fn handle_webhook(
        &self,
        agent_id: AgentId,
        route: &str,
        topic: &str,
        body: Value,
        token: Option<String>,
    ) -> HandlerResult {
        let ctx = WebhookContext::new(WebhookEvent::new(agent_id, route, topic, body, token));
        self.dispatch(&ctx).await
    }

    /// Selects and runs the topic handler for a delivery.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::UnroutableTopic`] for topics outside the
    /// agent's vocabulary, and propagates governance, cache, and admin
    /// errors from the selected handler.
    pub async fn dispatch(&self, ctx: &WebhookContext) -> HandlerResult {
        let topic: WebhookTopic =
            ctx.topic()
                .parse()
                .map_err(|_| HandlerError::UnroutableTopic {
                    topic: ctx.topic().to_owned(),
                })?;

        debug!(
            delivery = %ctx.delivery_id(),
            agent = %ctx.agent_id(),
            %topic,
            "dispatching webhook"
        );

        let handler: Box<dyn TopicHandler> = match topic {
            WebhookTopic::Connections => Box::new(ConnectionsHandler::new(
                Arc::clone(&self.engine),
                Arc::clone(&self.cache),
                Arc::clone(&self.admin),
            )),
            WebhookTopic::IssueCredential => Box::new(IssueCredentialHandler::new(
                Arc::clone(&self.engine),
                Arc::clone(&self.cache),
                Arc::clone(&self.admin),
            )),
            WebhookTopic::PresentProof => Box::new(PresentProofHandler::new(
                Arc::clone(&self.engine),
                Arc::clone(&self.cache),
                Arc::clone(&self.admin),
            )),
            WebhookTopic::ProblemReport => Box::new(ProblemReportHandler::new(
                Arc::clone(&self.engine),
                Arc::clone(&self.cache),
            )),
            WebhookTopic::Basicmessages => {
                Box::new(BasicMessageHandler::new(Arc::clone(&self.engine)))
            }
            WebhookTopic::RevocationRegistry | WebhookTopic::IssuerCredRev => {
                Box::new(NoopHandler::new(topic))
            }
        };

        handler.handle(ctx).await
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("profile", &self.engine.profile())
            .finish_non_exhaustive()
    }
}
