//! Governance-driven webhook controller SDK facade.
//!
//! Depend on this crate to embed the controller. It bundles the workspace
//! crates behind feature flags so downstream users can enable or disable
//! components as needed.

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives for convenience.
pub use governor_primitives as primitives;

/// Webhook dispatch and topic handlers (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use governor_kernel as kernel;

/// Governance policy store and engine (enabled by `policy` feature).
#[cfg(feature = "policy")]
pub use governor_policy as policy;

/// Idempotency key-value store (enabled by `cache` feature).
#[cfg(feature = "cache")]
pub use governor_cache as cache;

/// Agent admin HTTP client (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use governor_adapters as adapters;

/// Configuration management (enabled by `config` feature).
#[cfg(feature = "config")]
pub use governor_config as config;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use governor_telemetry as telemetry;
