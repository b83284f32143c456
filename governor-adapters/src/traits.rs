//! Shared admin-client trait and error types.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Result alias used by admin clients.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Error type shared by admin client implementations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Client is misconfigured (bad base URL, missing credentials).
    #[error("admin client not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// The request could not be encoded for the agent.
    #[error("invalid admin request: {reason}")]
    InvalidRequest {
        /// Reason the request could not be built.
        reason: String,
    },

    /// Transport-level failure (connect, timeout, protocol).
    #[error("admin transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The agent answered with a non-success status or malformed body.
    #[error("agent returned {status}: {reason}")]
    Response {
        /// HTTP status code reported by the agent.
        status: u16,
        /// Response body or decode failure description.
        reason: String,
    },
}

impl AdapterError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for invalid requests.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}

/// Admin API surface the topic handlers drive.
///
/// Only `get_json`/`post_json` touch the wire; the provided methods pin the
/// agent's protocol-fixed admin paths so handlers and tests share one
/// vocabulary. Paths are relative to the configured admin base URL. The
/// optional `token` is the tenant bearer credential of a multi-tenant agent.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Issues a GET and decodes the JSON response body.
    async fn get_json(&self, path: &str, token: Option<&str>) -> AdapterResult<Value>;

    /// Issues a POST with an optional JSON body and decodes the response.
    async fn post_json(
        &self,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> AdapterResult<Value>;

    /// Advances a connection exchange: `POST connections/{id}/{action}`.
    async fn connection_action(
        &self,
        connection_id: &str,
        action: &str,
        token: Option<&str>,
    ) -> AdapterResult<Value> {
        self.post_json(&format!("connections/{connection_id}/{action}"), None, token)
            .await
    }

    /// Advances a credential exchange:
    /// `POST issue-credential/records/{id}/{action}`.
    async fn credential_action(
        &self,
        credential_exchange_id: &str,
        action: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> AdapterResult<Value> {
        self.post_json(
            &format!("issue-credential/records/{credential_exchange_id}/{action}"),
            body,
            token,
        )
        .await
    }

    /// Fetches the credentials satisfying a presentation request:
    /// `GET present-proof/records/{id}/credentials`.
    async fn presentation_credentials(
        &self,
        presentation_exchange_id: &str,
        token: Option<&str>,
    ) -> AdapterResult<Value> {
        self.get_json(
            &format!("present-proof/records/{presentation_exchange_id}/credentials"),
            token,
        )
        .await
    }

    /// Advances a proof exchange:
    /// `POST present-proof/records/{id}/{action}`.
    async fn presentation_action(
        &self,
        presentation_exchange_id: &str,
        action: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> AdapterResult<Value> {
        self.post_json(
            &format!("present-proof/records/{presentation_exchange_id}/{action}"),
            body,
            token,
        )
        .await
    }
}
