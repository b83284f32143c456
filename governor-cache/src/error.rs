//! Error types for the idempotency store.

use thiserror::Error;

/// Errors emitted by store implementations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A networked backend failed; the in-memory store never raises this.
    #[error("cache backend failure: {reason}")]
    Backend {
        /// Human-readable reason for operators.
        reason: String,
    },

    /// A stored value could not be serialized or deserialized.
    #[error("cache serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}

impl CacheError {
    /// Creates a backend error from a string-like reason.
    #[must_use]
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend {
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type CacheResult<T> = Result<T, CacheError>;
