//! Proof-presentation topic handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use governor_adapters::traits::AdminApi;
use governor_cache::IdempotencyStore;
use governor_policy::GovernanceEngine;
use governor_primitives::WebhookTopic;

use crate::context::WebhookContext;
use crate::error::HandlerResult;
use crate::guard::ExchangeGuard;
use crate::handler::{acknowledged, ensure_delivery, TopicHandler};

/// Policy topic consulted for proof-exchange actions.
const POLICY_TOPIC: &str = "present-proof";

#[derive(Debug, Default, Deserialize)]
struct PresentationRecord {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    presentation_exchange_id: Option<String>,
    #[serde(default)]
    presentation_request: Option<PresentationRequest>,
}

#[derive(Debug, Default, Deserialize)]
struct PresentationRequest {
    #[serde(default)]
    requested_attributes: Map<String, Value>,
    #[serde(default)]
    requested_predicates: Map<String, Value>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct CredentialCandidate {
    #[serde(default)]
    cred_info: CredentialInfo,
    #[serde(default)]
    presentation_referents: Vec<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
struct CredentialInfo {
    /// Wallet identifier of the credential itself.
    #[serde(default)]
    referent: Option<String>,
    #[serde(default)]
    cred_rev_id: Option<String>,
}

impl CredentialCandidate {
    fn revision(&self) -> Option<u64> {
        self.cred_info
            .cred_rev_id
            .as_deref()
            .and_then(|raw| raw.parse().ok())
    }
}

/// Drives the verifier/prover proof-exchange state machine.
pub struct PresentProofHandler {
    engine: Arc<GovernanceEngine>,
    admin: Arc<dyn AdminApi>,
    guard: ExchangeGuard,
}

impl PresentProofHandler {
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

    async fn send_presentation(
        &self,
        ctx: &WebhookContext,
        record: &PresentationRecord,
        exchange_id: &str,
        key: &str,
    ) -> HandlerResult {
        // Peek-only here: when no credential matches, the reply is a refusal
        // and must not burn a single-use permission.
        self.guard
            .check(POLICY_TOPIC, "send-presentation", key)
            .await?;

        let raw = self
            .admin
            .presentation_credentials(exchange_id, ctx.token())
            .await?;
        let mut candidates: Vec<CredentialCandidate> =
            serde_json::from_value(raw).unwrap_or_default();
        sort_newest_first(&mut candidates);
        let assigned = assign_referents(&candidates);

        let empty = Map::new();
        let request = record.presentation_request.as_ref();
        let attributes = build_marks(
            request.map_or(&empty, |r| &r.requested_attributes),
            &assigned,
            true,
        );
        let predicates = build_marks(
            request.map_or(&empty, |r| &r.requested_predicates),
            &assigned,
            false,
        );

        if attributes.is_empty() && predicates.is_empty() {
            info!(
                agent = %ctx.agent_id(),
                exchange = exchange_id,
                "no credentials satisfy presentation request, sending problem report"
            );
            let description = json!({
                "code": "no_matching_credentials",
                "message": format!(
                    "no stored credentials satisfy the presentation request of exchange {exchange_id}"
                ),
            })
            .to_string();
            let response = self
                .admin
                .presentation_action(
                    exchange_id,
                    "problem-report",
                    Some(json!({ "description": description })),
                    ctx.token(),
                )
                .await?;
            return Ok(response);
        }

        self.guard
            .commit(POLICY_TOPIC, "send-presentation", key)
            .await?;

        let body = json!({
            "requested_attributes": Value::Object(attributes),
            "requested_predicates": Value::Object(predicates),
            // Self-attested values are never populated automatically.
            "self_attested_attributes": {},
        });
        let response = self
            .admin
            .presentation_action(exchange_id, "send-presentation", Some(body), ctx.token())
            .await?;
        Ok(response)
    }
}

#[async_trait]
impl TopicHandler for PresentProofHandler {
    async fn handle(&self, ctx: &WebhookContext) -> HandlerResult {
        ensure_delivery(ctx, WebhookTopic::PresentProof)?;

        if self.engine.invoke_callbacks(ctx.event()).await {
            return Ok(acknowledged("delivery handled by registered callback"));
        }

        let record = PresentationRecord::deserialize(ctx.body()).unwrap_or_default();
        let role = record.role.as_deref();
        let state = record.state.as_deref();

        let Some(exchange_id) = record.presentation_exchange_id.as_deref() else {
            debug!(agent = %ctx.agent_id(), "presentation record carries no exchange id");
            return Ok(acknowledged("no action for proof exchange state"));
        };
        let key = format!(
            "{}-{}-{}",
            ctx.agent_id(),
            role.unwrap_or_default(),
            exchange_id,
        );

        match (role, state) {
            (Some("verifier"), Some("presentation_received")) => {
                self.guard
                    .enforce(POLICY_TOPIC, "verify-presentation", &key)
                    .await?;
                let response = self
                    .admin
                    .presentation_action(exchange_id, "verify-presentation", None, ctx.token())
                    .await?;
                Ok(response)
            }
            (Some("prover"), Some("request_received")) => {
                self.send_presentation(ctx, &record, exchange_id, &key).await
            }
            (role, state) => {
                debug!(
                    agent = %ctx.agent_id(),
                    role = role.unwrap_or("<missing>"),
                    state = state.unwrap_or("<missing>"),
                    "no automatic action for proof exchange state"
                );
                Ok(acknowledged("no action for proof exchange state"))
            }
        }
    }
}

/// Reorders counter-bearing credentials newest-first.
///
/// Only candidates with a parseable revocation credential-revision counter
/// move; they are sorted descending among themselves and placed back into
/// the slots they occupied, so candidates without the counter keep their
/// original positions. Which credential wins a duplicate referent is a
/// behavioral contract downstream observers rely on; do not "improve" the
/// ordering.
fn sort_newest_first(candidates: &mut [CredentialCandidate]) {
    let mut counted: Vec<(usize, u64)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| candidate.revision().map(|rev| (index, rev)))
        .collect();

    let slots: Vec<usize> = counted.iter().map(|(index, _)| *index).collect();
    counted.sort_by(|a, b| b.1.cmp(&a.1));

    let reordered: Vec<CredentialCandidate> = counted
        .iter()
        .map(|(index, _)| candidates[*index].clone())
        .collect();
    for (slot, candidate) in slots.into_iter().zip(reordered) {
        candidates[slot] = candidate;
    }
}

/// Keeps the first (newest, after sorting) credential per requested referent.
fn assign_referents(candidates: &[CredentialCandidate]) -> HashMap<String, String> {
    let mut assigned = HashMap::new();
    for candidate in candidates {
        let Some(cred_id) = candidate.cred_info.referent.as_deref() else {
            continue;
        };
        for referent in &candidate.presentation_referents {
            assigned
                .entry(referent.clone())
                .or_insert_with(|| cred_id.to_owned());
        }
    }
    assigned
}

fn build_marks(
    requested: &Map<String, Value>,
    assigned: &HashMap<String, String>,
    revealed: bool,
) -> Map<String, Value> {
    let mut marks = Map::new();
    for referent in requested.keys() {
        if let Some(cred_id) = assigned.get(referent) {
            let mark = if revealed {
                json!({ "cred_id": cred_id, "revealed": true })
            } else {
                json!({ "cred_id": cred_id })
            };
            marks.insert(referent.clone(), mark);
        }
    }
    marks
}
