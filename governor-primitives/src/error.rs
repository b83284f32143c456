//! Shared error definitions for governor primitives.

use thiserror::Error;

/// Result alias used throughout the controller workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating primitive types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// The agent identifier was empty or whitespace.
    #[error("agent id cannot be empty")]
    EmptyAgentId,

    /// The topic string is not part of the agent's webhook vocabulary.
    #[error("unknown webhook topic `{topic}`")]
    UnknownTopic {
        /// The offending topic string.
        topic: String,
    },

    /// The permission string is not one of `deny`, `once`, or `always`.
    #[error("`{value}` is not a valid governance permission")]
    InvalidPermission {
        /// The offending permission string.
        value: String,
    },
}
