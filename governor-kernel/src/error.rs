//! Error taxonomy for webhook handling.

use serde_json::Value;
use thiserror::Error;

use governor_adapters::traits::AdapterError;
use governor_cache::CacheError;
use governor_policy::GovernanceError;

/// Result alias for webhook handling; handlers resolve to the JSON value
/// returned to the webhook caller.
pub type HandlerResult<T = Value> = Result<T, HandlerError>;

/// Errors that can abort a webhook delivery.
///
/// None of these are retried inside the kernel; they surface to the
/// delivery framework so a stalled exchange is loud rather than silent.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The topic is outside the agent's webhook vocabulary entirely.
    #[error("no handler registered for webhook topic `{topic}`")]
    UnroutableTopic {
        /// The unmapped topic string.
        topic: String,
    },

    /// A handler received a route/topic pair it does not own.
    #[error("handler for `{expected}` received route `{route}` with topic `{topic}`")]
    UnexpectedDelivery {
        /// Topic the handler is built for.
        expected: &'static str,
        /// Route segment actually delivered.
        route: String,
        /// Topic actually delivered.
        topic: String,
    },

    /// Governance refused the automatic action.
    #[error(transparent)]
    Governance(#[from] GovernanceError),

    /// The idempotency store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The outbound call to the agent failed.
    #[error(transparent)]
    Admin(#[from] AdapterError),
}

impl HandlerError {
    /// Returns `true` when the error is a governance refusal.
    #[must_use]
    pub const fn is_governance(&self) -> bool {
        matches!(self, Self::Governance(_))
    }
}
