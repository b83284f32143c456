//! Configuration for the webhook controller.
//!
//! Settings come from the environment (container deployments) or from a
//! JSON document; the composition root feeds them into the adapter and
//! policy crates at startup.

#![warn(missing_docs, clippy::pedantic)]

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

/// Environment variable holding the agent admin base URL.
pub const ADMIN_URL_ENV: &str = "ACAPY_ADMIN_URL";
/// Environment variable holding the admin API key.
pub const ADMIN_API_KEY_ENV: &str = "ACAPY_ADMIN_API_KEY";
/// Environment variable selecting the governance profile.
pub const GOVERNANCE_PROFILE_ENV: &str = "GOVERNANCE_PROFILE";
/// Environment variable pointing at an external policy document.
pub const GOVERNANCE_POLICY_PATH_ENV: &str = "GOVERNANCE_POLICY_PATH";
/// Environment variable overriding the admin request timeout, in seconds.
pub const ADMIN_TIMEOUT_ENV: &str = "ACAPY_ADMIN_TIMEOUT_SECS";

fn default_profile() -> String {
    "default".to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Controller settings shared by the dispatcher and its collaborators.
#[derive(Clone, Debug, Deserialize)]
pub struct ControllerConfig {
    /// Base URL of the agent's admin interface.
    pub admin_url: String,
    /// Admin API key attached to every outbound call, when set.
    #[serde(default)]
    pub admin_api_key: Option<String>,
    /// Governance profile deliveries are evaluated against.
    #[serde(default = "default_profile")]
    pub governance_profile: String,
    /// Optional path to a policy document replacing the bundled one.
    #[serde(default)]
    pub policy_document_path: Option<PathBuf>,
    /// Per-request timeout for admin calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub admin_timeout_secs: u64,
}

impl ControllerConfig {
    /// Loads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Fails when `ACAPY_ADMIN_URL` is missing or the timeout override is
    /// not a number.
    pub fn from_env() -> anyhow::Result<Self> {
        let admin_url = env::var(ADMIN_URL_ENV)
            .with_context(|| format!("{ADMIN_URL_ENV} is not set"))?;
        let admin_timeout_secs = match env::var(ADMIN_TIMEOUT_ENV) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("{ADMIN_TIMEOUT_ENV} must be a number of seconds"))?,
            Err(_) => default_timeout_secs(),
        };

        let config = Self {
            admin_url,
            admin_api_key: env::var(ADMIN_API_KEY_ENV).ok(),
            governance_profile: env::var(GOVERNANCE_PROFILE_ENV)
                .unwrap_or_else(|_| default_profile()),
            policy_document_path: env::var(GOVERNANCE_POLICY_PATH_ENV).ok().map(PathBuf::from),
            admin_timeout_secs,
        };
        debug!(
            profile = config.governance_profile,
            timeout = config.admin_timeout_secs,
            "controller configuration loaded"
        );
        Ok(config)
    }

    /// Returns the admin request timeout as a [`Duration`].
    #[must_use]
    pub const fn admin_timeout(&self) -> Duration {
        Duration::from_secs(self.admin_timeout_secs)
    }

    /// Reads the external policy document, when one is configured.
    ///
    /// Returns `None` when no path is set, letting the caller fall back to
    /// the bundled document.
    ///
    /// # Errors
    ///
    /// Fails when the configured file cannot be read or is not JSON.
    pub fn policy_document(&self) -> anyhow::Result<Option<Value>> {
        let Some(path) = &self.policy_document_path else {
            return Ok(None);
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy document {}", path.display()))?;
        let value = serde_json::from_str(&text)
            .with_context(|| format!("policy document {} is not valid JSON", path.display()))?;
        Ok(Some(value))
    }
}
