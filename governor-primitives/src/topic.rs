//! Webhook topics emitted by the cloud agent.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Protocol subsystems the agent reports state transitions for.
///
/// The variants mirror the agent's webhook vocabulary verbatim; anything
/// outside this set is a routing error at the dispatcher.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookTopic {
    /// Connection establishment exchanges.
    Connections,
    /// Credential issuance exchanges.
    IssueCredential,
    /// Proof presentation exchanges.
    PresentProof,
    /// Problem reports raised by either party of an exchange.
    ProblemReport,
    /// Free-form messages between connected agents.
    Basicmessages,
    /// Revocation registry housekeeping events.
    RevocationRegistry,
    /// Per-credential revocation status events.
    IssuerCredRev,
}

impl WebhookTopic {
    /// Returns the wire name used by the agent when delivering webhooks.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Connections => "connections",
            Self::IssueCredential => "issue_credential",
            Self::PresentProof => "present_proof",
            Self::ProblemReport => "problem_report",
            Self::Basicmessages => "basicmessages",
            Self::RevocationRegistry => "revocation_registry",
            Self::IssuerCredRev => "issuer_cred_rev",
        }
    }

    /// Returns the topic name used in governance policy documents.
    ///
    /// The policy vocabulary is hyphenated where the wire vocabulary uses
    /// underscores, and `basicmessages` flattens to `basic-message`.
    #[must_use]
    pub const fn policy_key(self) -> &'static str {
        match self {
            Self::Connections => "connections",
            Self::IssueCredential => "issue-credential",
            Self::PresentProof => "present-proof",
            Self::ProblemReport => "problem-report",
            Self::Basicmessages => "basic-message",
            Self::RevocationRegistry => "revocation-registry",
            Self::IssuerCredRev => "issuer-cred-rev",
        }
    }
}

impl Display for WebhookTopic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for WebhookTopic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "connections" => Ok(Self::Connections),
            "issue_credential" => Ok(Self::IssueCredential),
            "present_proof" => Ok(Self::PresentProof),
            "problem_report" => Ok(Self::ProblemReport),
            "basicmessages" => Ok(Self::Basicmessages),
            "revocation_registry" => Ok(Self::RevocationRegistry),
            "issuer_cred_rev" => Ok(Self::IssuerCredRev),
            other => Err(Error::UnknownTopic {
                topic: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_wire_names() {
        for topic in [
            WebhookTopic::Connections,
            WebhookTopic::IssueCredential,
            WebhookTopic::PresentProof,
            WebhookTopic::ProblemReport,
            WebhookTopic::Basicmessages,
            WebhookTopic::RevocationRegistry,
            WebhookTopic::IssuerCredRev,
        ] {
            let parsed = topic.wire_name().parse::<WebhookTopic>().expect("parse");
            assert_eq!(parsed, topic);
        }
    }

    #[test]
    fn unknown_topic_is_an_error() {
        let err = "nonexistent_topic"
            .parse::<WebhookTopic>()
            .expect_err("should error");
        assert_eq!(
            err,
            Error::UnknownTopic {
                topic: "nonexistent_topic".into()
            }
        );
    }

    #[test]
    fn policy_keys_use_policy_vocabulary() {
        assert_eq!(WebhookTopic::IssueCredential.policy_key(), "issue-credential");
        assert_eq!(WebhookTopic::Basicmessages.policy_key(), "basic-message");
        assert_eq!(WebhookTopic::Connections.policy_key(), "connections");
    }
}
