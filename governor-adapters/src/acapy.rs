//! Hyper-backed admin client for an ACA-Py style cloud agent.

use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Method, Request, Uri};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::http_client::{HyperClient, build_admin_client};
use crate::traits::{AdapterError, AdapterResult, AdminApi};

/// Environment variable holding the agent admin base URL.
pub const ADMIN_URL_ENV: &str = "ACAPY_ADMIN_URL";
/// Environment variable holding the admin API key.
pub const ADMIN_API_KEY_ENV: &str = "ACAPY_ADMIN_API_KEY";

/// Header carrying the admin API key on every request.
const API_KEY_HEADER: &str = "x-api-key";

/// Configuration for the admin client.
#[derive(Clone, Debug)]
pub struct AcapyConfig {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl AcapyConfig {
    /// Creates a configuration targeting the supplied admin base URL.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> AdapterResult<Self> {
        Ok(Self {
            base_url: sanitize_base_url(base_url.as_ref())?,
            api_key: None,
            timeout: Duration::from_secs(30),
        })
    }

    /// Loads the base URL and API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when `ACAPY_ADMIN_URL` is
    /// missing or invalid.
    pub fn from_env() -> AdapterResult<Self> {
        let base_url = env::var(ADMIN_URL_ENV).map_err(|_| {
            AdapterError::configuration(format!("{ADMIN_URL_ENV} is not set"))
        })?;
        let mut config = Self::new(base_url)?;
        config.api_key = env::var(ADMIN_API_KEY_ENV).ok();
        Ok(config)
    }

    /// Supplies the admin API key attached as `x-api-key`.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Admin client that drives the agent's HTTP admin interface.
///
/// No retry logic lives here: a failed call surfaces as an error to the
/// webhook delivery that triggered it.
pub struct AcapyAdminClient {
    client: HyperClient,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl fmt::Debug for AcapyAdminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AcapyAdminClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AcapyAdminClient {
    /// Constructs a client from the supplied configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the TLS stack cannot be
    /// initialized.
    pub fn new(config: AcapyConfig) -> AdapterResult<Self> {
        Ok(Self {
            client: build_admin_client()?,
            base_url: config.base_url,
            api_key: config.api_key,
            timeout: config.timeout,
        })
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> AdapterResult<Value> {
        let uri = format!("{}{}", self.base_url, path.trim_start_matches('/'))
            .parse::<Uri>()
            .map_err(|err| AdapterError::invalid_request(format!("invalid admin path: {err}")))?;

        debug!(method = %method, %uri, "admin request");

        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(value) => {
                let encoded = serde_json::to_vec(&value).map_err(|err| {
                    AdapterError::invalid_request(format!("failed to encode admin body: {err}"))
                })?;
                builder
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from(encoded))
            }
            None => builder.body(Body::empty()),
        }
        .map_err(|err| AdapterError::transport(format!("failed to build admin request: {err}")))?;

        let response = timeout(self.timeout, self.client.request(request))
            .await
            .map_err(|_| AdapterError::transport("admin request timed out"))?
            .map_err(|err| AdapterError::transport(format!("admin request failed: {err}")))?;

        let status = response.status();
        let bytes = to_bytes(response.into_body())
            .await
            .map_err(|err| AdapterError::transport(format!("failed to read admin response: {err}")))?;

        if !status.is_success() {
            return Err(AdapterError::Response {
                status: status.as_u16(),
                reason: String::from_utf8_lossy(&bytes).to_string(),
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| AdapterError::Response {
            status: status.as_u16(),
            reason: format!("failed to decode admin response: {err}"),
        })
    }
}

#[async_trait]
impl AdminApi for AcapyAdminClient {
    async fn get_json(&self, path: &str, token: Option<&str>) -> AdapterResult<Value> {
        self.request(Method::GET, path, None, token).await
    }

    async fn post_json(
        &self,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> AdapterResult<Value> {
        self.request(Method::POST, path, body, token).await
    }
}

fn sanitize_base_url(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "admin base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid admin base URL: {err}")))?;
    Ok(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_requires_scheme() {
        let err = AcapyConfig::new("agent.example.com").expect_err("missing scheme should error");
        assert!(matches!(err, AdapterError::Configuration { .. }));
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let config = AcapyConfig::new("https://agent.example.com/admin").expect("valid URL");
        assert_eq!(config.base_url, "https://agent.example.com/admin/");
    }

    #[test]
    fn plain_http_is_accepted_for_development() {
        let config = AcapyConfig::new("http://localhost:8031").expect("valid URL");
        assert_eq!(config.base_url, "http://localhost:8031/");
    }
}
