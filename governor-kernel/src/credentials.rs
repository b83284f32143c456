//! Credential-issuance topic handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use governor_adapters::traits::AdminApi;
use governor_cache::IdempotencyStore;
use governor_policy::GovernanceEngine;
use governor_primitives::WebhookTopic;

use crate::context::WebhookContext;
use crate::error::HandlerResult;
use crate::guard::ExchangeGuard;
use crate::handler::{acknowledged, ensure_delivery, TopicHandler};

/// Policy topic consulted for credential-exchange actions.
const POLICY_TOPIC: &str = "issue-credential";

#[derive(Debug, Default, Deserialize)]
struct CredentialExchangeRecord {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    auto_issue: Option<bool>,
    #[serde(default)]
    credential_exchange_id: Option<String>,
    #[serde(default)]
    credential_offer_dict: Option<CredentialOffer>,
}

#[derive(Debug, Default, Deserialize)]
struct CredentialOffer {
    #[serde(default)]
    credential_preview: Option<Value>,
}

/// Drives the issuer/holder credential-exchange state machine.
pub struct IssueCredentialHandler {
    engine: Arc<GovernanceEngine>,
    admin: Arc<dyn AdminApi>,
    guard: ExchangeGuard,
}

impl IssueCredentialHandler {
    /// Creates a handler over the shared collaborators.
    #[must_use]
    pub fn new(
        engine: Arc<GovernanceEngine>,
        cache: Arc<dyn IdempotencyStore>,
        admin: Arc<dyn AdminApi>,
    ) -> Self {
        Self {
            guard: ExchangeGuard::new(Arc::clone(&engine), cache),
            engine,
            admin,
        }
    }
}

#[async_trait]
impl TopicHandler for IssueCredentialHandler {
    async fn handle(&self, ctx: &WebhookContext) -> HandlerResult {
        ensure_delivery(ctx, WebhookTopic::IssueCredential)?;

        if self.engine.invoke_callbacks(ctx.event()).await {
            return Ok(acknowledged("delivery handled by registered callback"));
        }

        let record = CredentialExchangeRecord::deserialize(ctx.body()).unwrap_or_default();
        let role = record.role.as_deref();
        let state = record.state.as_deref();

        // The issuer role may be absent on agents that only ever issue.
        let (action, body) = match (role, state) {
            (Some("holder"), Some("offer_received")) => ("send-request", None),
            (Some("issuer") | None, Some("request_received")) => {
                if record.auto_issue == Some(true) {
                    // The agent issues on its own; acting here would duplicate
                    // the credential. Deliberate skip, not a policy denial.
                    debug!(agent = %ctx.agent_id(), "agent auto-issues, skipping issue action");
                    return Ok(acknowledged("agent configured to auto-issue"));
                }
                let preview = record
                    .credential_offer_dict
                    .and_then(|offer| offer.credential_preview)
                    .unwrap_or(Value::Null);
                ("issue", Some(json!({ "credential_preview": preview })))
            }
            (Some("holder"), Some("credential_received")) => ("store", None),
            (role, state) => {
                debug!(
                    agent = %ctx.agent_id(),
                    role = role.unwrap_or("<missing>"),
                    state = state.unwrap_or("<missing>"),
                    "no automatic action for credential exchange state"
                );
                return Ok(acknowledged("no action for credential exchange state"));
            }
        };

        let Some(credential_exchange_id) = record.credential_exchange_id.as_deref() else {
            debug!(agent = %ctx.agent_id(), action, "credential record carries no exchange id");
            return Ok(acknowledged("no action for credential exchange state"));
        };

        let key = format!(
            "{}-{}-{}",
            ctx.agent_id(),
            record.role.as_deref().unwrap_or_default(),
            credential_exchange_id,
        );
        self.guard.enforce(POLICY_TOPIC, action, &key).await?;

        let response = self
            .admin
            .credential_action(credential_exchange_id, action, body, ctx.token())
            .await?;
        Ok(response)
    }
}
