//! Core shared types for the Aries governor controller.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod event;
mod ids;
mod permission;
mod topic;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Webhook payload shared between the kernel and registered callbacks.
pub use event::WebhookEvent;
/// Identifier of the tenant agent a webhook belongs to.
pub use ids::AgentId;
/// Governance permission values.
pub use permission::Permission;
/// Protocol topics emitted by the cloud agent.
pub use topic::WebhookTopic;
