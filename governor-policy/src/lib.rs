//! Governance policy evaluation for the webhook controller.
//!
//! A [`PolicyDocument`] holds named permission profiles; a
//! [`GovernanceEngine`] owns the flattened table for exactly one profile and
//! tracks single-use permission consumption plus registered webhook
//! callbacks. The [`GovernanceRegistry`] caches one engine per profile for
//! the life of the process so consumption state survives across deliveries.

#![warn(missing_docs, clippy::pedantic)]

mod callbacks;
mod document;
mod engine;
mod registry;

/// Callback trait, registration record, and callback error type.
pub use callbacks::{CallbackError, CallbackRegistration, CallbackResult, WebhookCallback};
/// Policy document loading and the flattened per-profile table.
pub use document::{EffectivePolicy, PolicyDocument, PolicyError, PolicyResult, TopicRule};
/// Permission engine bound to a single policy profile.
pub use engine::{GovernanceEngine, GovernanceError};
/// Process-wide cache of engines keyed by profile name.
pub use registry::GovernanceRegistry;
