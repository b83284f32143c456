//! Uniform contract shared by topic handlers.

use async_trait::async_trait;
use serde_json::{json, Value};

use governor_primitives::WebhookTopic;

use crate::context::WebhookContext;
use crate::error::{HandlerError, HandlerResult};

/// Route segment the upstream delivery framework uses for every webhook.
pub(crate) const WEBHOOK_ROUTE: &str = "topic";

/// Trait implemented by per-topic webhook handlers.
///
/// Handlers are constructed fresh per dispatch and carry no state of their
/// own; everything shared lives in the injected engine, store, and admin
/// client.
#[async_trait]
pub trait TopicHandler: Send + Sync {
    /// Advances the protocol for one webhook delivery.
    async fn handle(&self, ctx: &WebhookContext) -> HandlerResult;
}

/// Fixed acknowledgement body returned when no protocol action is taken.
#[must_use]
pub fn acknowledged(message: &str) -> Value {
    json!({ "success": true, "message": message })
}

/// Rejects deliveries whose route/topic pair does not belong to `expected`.
pub(crate) fn ensure_delivery(
    ctx: &WebhookContext,
    expected: WebhookTopic,
) -> Result<(), HandlerError> {
    if ctx.route() != WEBHOOK_ROUTE || ctx.topic() != expected.wire_name() {
        return Err(HandlerError::UnexpectedDelivery {
            expected: expected.wire_name(),
            route: ctx.route().to_owned(),
            topic: ctx.topic().to_owned(),
        });
    }
    Ok(())
}
