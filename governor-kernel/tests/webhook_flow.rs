use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};

use governor_adapters::traits::{AdapterResult, AdminApi};
use governor_cache::{IdempotencyStore, VolatileCache};
use governor_kernel::{Dispatcher, HandlerError};
use governor_policy::{GovernanceEngine, GovernanceError, PolicyDocument};
use governor_primitives::{AgentId, WebhookEvent};

#[derive(Clone, Debug, PartialEq)]
struct AdminCall {
    method: &'static str,
    path: String,
    body: Option<Value>,
}

/// Admin stub that records every call and answers with canned values.
struct RecordingAdmin {
    calls: Mutex<Vec<AdminCall>>,
    credentials: Value,
}

impl RecordingAdmin {
    fn new() -> Self {
        Self::with_credentials(json!([]))
    }

    fn with_credentials(credentials: Value) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            credentials,
        }
    }

    fn calls(&self) -> Vec<AdminCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminApi for RecordingAdmin {
    async fn get_json(&self, path: &str, _token: Option<&str>) -> AdapterResult<Value> {
        self.calls.lock().unwrap().push(AdminCall {
            method: "GET",
            path: path.to_owned(),
            body: None,
        });
        Ok(self.credentials.clone())
    }

    async fn post_json(
        &self,
        path: &str,
        body: Option<Value>,
        _token: Option<&str>,
    ) -> AdapterResult<Value> {
        self.calls.lock().unwrap().push(AdminCall {
            method: "POST",
            path: path.to_owned(),
            body,
        });
        Ok(json!({ "ok": true }))
    }
}

struct Harness {
    dispatcher: Dispatcher,
    admin: Arc<RecordingAdmin>,
    cache: Arc<VolatileCache>,
}

fn harness(policy: Value, profile: &str) -> Harness {
    harness_with_admin(policy, profile, RecordingAdmin::new())
}

fn harness_with_admin(policy: Value, profile: &str, admin: RecordingAdmin) -> Harness {
    let document = PolicyDocument::from_value(policy).expect("policy document");
    let engine = Arc::new(GovernanceEngine::new(&document, profile));
    let admin = Arc::new(admin);
    let cache = Arc::new(VolatileCache::new());
    let dispatcher = Dispatcher::new(
        engine,
        Arc::<VolatileCache>::clone(&cache),
        Arc::<RecordingAdmin>::clone(&admin),
    );
    Harness {
        dispatcher,
        admin,
        cache,
    }
}

fn agent() -> AgentId {
    AgentId::new("agent-1").unwrap()
}

fn is_governance_denial(err: &HandlerError) -> bool {
    matches!(
        err,
        HandlerError::Governance(
            GovernanceError::Denied { .. } | GovernanceError::AlreadyFulfilled { .. }
        )
    )
}

#[tokio::test]
async fn once_permission_accepts_a_connection_invitation_exactly_once() {
    let harness = harness(
        json!({
            "default": { "all": "deny" },
            "demo": { "connections": { "accept-invitation": "once" } }
        }),
        "demo",
    );
    let body = json!({
        "rfc23_state": "invitation-received",
        "state": "invitation",
        "initiator": "external",
        "connection_id": "conn-1"
    });

    let response = harness
        .dispatcher
        .handle_webhook(agent(), "topic", "connections", body.clone(), None)
        .await
        .expect("first invitation accepted");
    assert_eq!(response, json!({ "ok": true }));

    let calls = harness.admin.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[0].path, "connections/conn-1/accept-invitation");

    let err = harness
        .dispatcher
        .handle_webhook(agent(), "topic", "connections", body, None)
        .await
        .expect_err("second invitation refused");
    assert!(is_governance_denial(&err), "unexpected error: {err}");
    assert_eq!(harness.admin.calls().len(), 1, "no second admin call");
}

#[tokio::test]
async fn denied_connection_states_never_reach_the_agent() {
    let harness = harness(json!({ "default": { "all": "deny" } }), "default");
    let body = json!({
        "rfc23_state": "request-received",
        "state": "request",
        "initiator": "self",
        "connection_id": "conn-2"
    });

    let err = harness
        .dispatcher
        .handle_webhook(agent(), "topic", "connections", body, None)
        .await
        .expect_err("policy denies");
    assert!(is_governance_denial(&err));
    assert!(harness.admin.calls().is_empty());
}

#[tokio::test]
async fn unhandled_connection_states_are_acknowledged() {
    let harness = harness(json!({ "default": { "all": "deny" } }), "default");
    let body = json!({ "rfc23_state": "completed", "connection_id": "conn-3" });

    let response = harness
        .dispatcher
        .handle_webhook(agent(), "topic", "connections", body, None)
        .await
        .expect("observation only");
    assert_eq!(response["success"], true);
    assert!(harness.admin.calls().is_empty());
}

#[tokio::test]
async fn auto_issue_skips_the_issue_action_regardless_of_policy() {
    let harness = harness(
        json!({
            "default": { "all": "deny" },
            "issuer": { "issue-credential": { "issue": "always" } }
        }),
        "issuer",
    );
    let body = json!({
        "role": "issuer",
        "state": "request_received",
        "auto_issue": true,
        "credential_exchange_id": "ce-1"
    });

    let response = harness
        .dispatcher
        .handle_webhook(agent(), "topic", "issue_credential", body, None)
        .await
        .expect("deliberate skip");
    assert_eq!(response["success"], true);
    assert!(harness.admin.calls().is_empty());
}

#[tokio::test]
async fn issuer_issues_with_the_offered_preview() {
    let harness = harness(
        json!({
            "default": { "all": "deny" },
            "issuer": { "issue-credential": { "issue": "always" } }
        }),
        "issuer",
    );
    let preview = json!({
        "@type": "issue-credential/1.0/credential-preview",
        "attributes": [{ "name": "score", "value": "750" }]
    });
    let body = json!({
        "role": "issuer",
        "state": "request_received",
        "auto_issue": false,
        "credential_exchange_id": "ce-2",
        "credential_offer_dict": { "credential_preview": preview }
    });

    harness
        .dispatcher
        .handle_webhook(agent(), "topic", "issue_credential", body, None)
        .await
        .expect("issue allowed");

    let calls = harness.admin.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "issue-credential/records/ce-2/issue");
    assert_eq!(calls[0].body.as_ref().unwrap()["credential_preview"], preview);
}

#[tokio::test]
async fn holder_advances_offer_and_storage_states() {
    let harness = harness(
        json!({
            "default": { "all": "deny" },
            "holder": { "issue-credential": { "send-request": "always", "store": "always" } }
        }),
        "holder",
    );

    harness
        .dispatcher
        .handle_webhook(
            agent(),
            "topic",
            "issue_credential",
            json!({ "role": "holder", "state": "offer_received", "credential_exchange_id": "ce-3" }),
            None,
        )
        .await
        .expect("request sent");
    harness
        .dispatcher
        .handle_webhook(
            agent(),
            "topic",
            "issue_credential",
            json!({ "role": "holder", "state": "credential_received", "credential_exchange_id": "ce-3" }),
            None,
        )
        .await
        .expect("credential stored");

    let paths: Vec<_> = harness.admin.calls().into_iter().map(|c| c.path).collect();
    assert_eq!(
        paths,
        [
            "issue-credential/records/ce-3/send-request",
            "issue-credential/records/ce-3/store"
        ]
    );
}

#[tokio::test]
async fn empty_credential_set_turns_into_a_problem_report() {
    let harness = harness_with_admin(
        json!({
            "default": { "all": "deny" },
            "prover": { "present-proof": { "send-presentation": "always" } }
        }),
        "prover",
        RecordingAdmin::with_credentials(json!([])),
    );
    let body = json!({
        "role": "prover",
        "state": "request_received",
        "presentation_exchange_id": "pe-1",
        "presentation_request": {
            "requested_attributes": { "attr_1": { "name": "score" } },
            "requested_predicates": {}
        }
    });

    harness
        .dispatcher
        .handle_webhook(agent(), "topic", "present_proof", body, None)
        .await
        .expect("refusal is not an error");

    let calls = harness.admin.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].method, "GET");
    assert_eq!(calls[0].path, "present-proof/records/pe-1/credentials");
    assert_eq!(calls[1].path, "present-proof/records/pe-1/problem-report");

    let description = calls[1].body.as_ref().unwrap()["description"]
        .as_str()
        .unwrap()
        .to_owned();
    let parsed: Value = serde_json::from_str(&description).expect("description is encoded JSON");
    assert_eq!(parsed["code"], "no_matching_credentials");
    assert!(parsed["message"].as_str().unwrap().contains("pe-1"));
}

#[tokio::test]
async fn prover_presents_the_newest_credential_per_referent() {
    let credentials = json!([
        {
            "cred_info": { "referent": "cred-old", "cred_rev_id": "2" },
            "presentation_referents": ["attr_1", "pred_1"]
        },
        {
            "cred_info": { "referent": "cred-new", "cred_rev_id": "9" },
            "presentation_referents": ["attr_1"]
        }
    ]);
    let harness = harness_with_admin(
        json!({
            "default": { "all": "deny" },
            "prover": { "present-proof": { "send-presentation": "always" } }
        }),
        "prover",
        RecordingAdmin::with_credentials(credentials),
    );
    let body = json!({
        "role": "prover",
        "state": "request_received",
        "presentation_exchange_id": "pe-2",
        "presentation_request": {
            "requested_attributes": { "attr_1": { "name": "score" } },
            "requested_predicates": { "pred_1": { "name": "age" } }
        }
    });

    harness
        .dispatcher
        .handle_webhook(agent(), "topic", "present_proof", body, None)
        .await
        .expect("presentation sent");

    let calls = harness.admin.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].path, "present-proof/records/pe-2/send-presentation");

    let sent = calls[1].body.as_ref().unwrap();
    assert_eq!(
        sent["requested_attributes"]["attr_1"],
        json!({ "cred_id": "cred-new", "revealed": true })
    );
    assert_eq!(
        sent["requested_predicates"]["pred_1"],
        json!({ "cred_id": "cred-old" })
    );
    assert_eq!(sent["self_attested_attributes"], json!({}));
}

#[tokio::test]
async fn verifier_verifies_received_presentations() {
    let harness = harness(
        json!({
            "default": { "all": "deny" },
            "verifier": { "present-proof": { "verify-presentation": "always" } }
        }),
        "verifier",
    );
    let body = json!({
        "role": "verifier",
        "state": "presentation_received",
        "presentation_exchange_id": "pe-3"
    });

    harness
        .dispatcher
        .handle_webhook(agent(), "topic", "present_proof", body, None)
        .await
        .expect("verification requested");

    let calls = harness.admin.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "present-proof/records/pe-3/verify-presentation");
}

#[tokio::test]
async fn denied_basic_messages_fail_before_any_callback_runs() {
    let harness = harness(
        json!({ "default": { "all": "deny", "basic-message": { "all": "deny" } } }),
        "default",
    );
    let invoked = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&invoked);
    harness.dispatcher.engine().register_callback(
        "listener",
        "basicmessages",
        move |_event: WebhookEvent| {
            let count = Arc::clone(&count);
            async move {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
        },
    );

    let err = harness
        .dispatcher
        .handle_webhook(
            agent(),
            "topic",
            "basicmessages",
            json!({ "content": "hello" }),
            None,
        )
        .await
        .expect_err("policy denies");
    assert!(is_governance_denial(&err));
    assert_eq!(invoked.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn permitted_basic_messages_delegate_to_callbacks() {
    let harness = harness(
        json!({ "default": { "all": "deny", "basic-message": { "all": "always" } } }),
        "default",
    );
    harness.dispatcher.engine().register_callback(
        "listener",
        "basicmessages",
        |_event: WebhookEvent| async move { Ok(true) },
    );

    let response = harness
        .dispatcher
        .handle_webhook(
            agent(),
            "topic",
            "basicmessages",
            json!({ "content": "hello" }),
            None,
        )
        .await
        .expect("delegated");
    assert_eq!(response["handled"], true);
    assert!(harness.admin.calls().is_empty());
}

#[tokio::test]
async fn unroutable_topics_are_fatal() {
    let harness = harness(json!({ "default": { "all": "always" } }), "default");

    let err = harness
        .dispatcher
        .handle_webhook(agent(), "topic", "nonexistent_topic", json!({}), None)
        .await
        .expect_err("unknown topic");
    assert!(matches!(
        err,
        HandlerError::UnroutableTopic { topic } if topic == "nonexistent_topic"
    ));
}

#[tokio::test]
async fn revocation_topics_acknowledge_without_consulting_anything() {
    let harness = harness(json!({ "default": { "all": "deny" } }), "default");

    for topic in ["revocation_registry", "issuer_cred_rev"] {
        let response = harness
            .dispatcher
            .handle_webhook(agent(), "topic", topic, json!({}), None)
            .await
            .expect("fixed acknowledgement");
        assert_eq!(response["success"], true);
    }
    assert!(harness.admin.calls().is_empty());
}

#[tokio::test]
async fn callbacks_preempt_builtin_connection_handling() {
    let harness = harness(
        json!({
            "default": { "all": "deny" },
            "demo": { "connections": { "accept-invitation": "always" } }
        }),
        "demo",
    );
    harness.dispatcher.engine().register_callback(
        "interceptor",
        "connections",
        |_event: WebhookEvent| async move { Ok(true) },
    );

    let response = harness
        .dispatcher
        .handle_webhook(
            agent(),
            "topic",
            "connections",
            json!({
                "rfc23_state": "invitation-received",
                "state": "invitation",
                "initiator": "external",
                "connection_id": "conn-9"
            }),
            None,
        )
        .await
        .expect("callback claimed the delivery");
    assert_eq!(response["success"], true);
    assert!(harness.admin.calls().is_empty());
}

#[tokio::test]
async fn problem_reports_are_cached_by_thread_id() {
    let harness = harness(json!({ "default": { "all": "deny" } }), "default");
    let body = json!({
        "~thread": { "thid": "thread-7" },
        "description": "issuance abandoned: holder unreachable"
    });

    let response = harness
        .dispatcher
        .handle_webhook(agent(), "topic", "problem_report", body, None)
        .await
        .expect("reports are always accepted");
    assert_eq!(response["success"], true);

    let cached = harness.cache.get("thread-7").await.unwrap();
    assert_eq!(
        cached,
        Some(json!("issuance abandoned: holder unreachable"))
    );
}

#[tokio::test]
async fn mismatched_route_is_a_routing_error() {
    let harness = harness(json!({ "default": { "all": "always" } }), "default");

    let err = harness
        .dispatcher
        .handle_webhook(agent(), "hook", "connections", json!({}), None)
        .await
        .expect_err("route must be `topic`");
    assert!(matches!(err, HandlerError::UnexpectedDelivery { .. }));
}
