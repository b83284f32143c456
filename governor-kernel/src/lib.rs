//! Webhook dispatch engine for the Aries governor controller.
//!
//! An inbound webhook becomes a [`WebhookContext`]; the [`Dispatcher`]
//! selects the topic handler that knows how to advance that protocol, the
//! handler gives registered callbacks the first look at the delivery, and
//! any protocol-advancing action passes through governance and the
//! per-exchange idempotency guard before the agent is called.

#![warn(missing_docs, clippy::pedantic)]

mod connections;
mod context;
mod credentials;
mod dispatch;
mod error;
mod guard;
mod handler;
mod messages;
mod proofs;

/// Connection-establishment topic handler.
pub use connections::ConnectionsHandler;
/// One webhook delivery plus its correlation metadata.
pub use context::WebhookContext;
/// Credential-issuance topic handler.
pub use credentials::IssueCredentialHandler;
/// Topic-to-handler selection.
pub use dispatch::Dispatcher;
/// Error type and result alias for webhook handling.
pub use error::{HandlerError, HandlerResult};
/// Check/commit idempotency guard around governed actions.
pub use guard::ExchangeGuard;
/// Uniform handler contract and the fixed acknowledgement shape.
pub use handler::{acknowledged, TopicHandler};
/// Problem-report, basic-message, and no-op handlers.
pub use messages::{BasicMessageHandler, NoopHandler, ProblemReportHandler};
/// Proof-presentation topic handler.
pub use proofs::PresentProofHandler;
