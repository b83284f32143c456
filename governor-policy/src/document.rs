//! Policy document loading, merging, and validation.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use governor_primitives::Permission;

/// Reserved top-level key stripped before any policy lookup.
const COMMENT_KEY: &str = "comment";
/// Reserved profile merged beneath every named profile.
const DEFAULT_KEY: &str = "default";
/// Reserved topic holding the fallback permission.
const ALL_KEY: &str = "all";

/// Result alias for policy document operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors raised while loading a policy document.
///
/// Malformed permission *values* never error; they degrade to `deny` with a
/// warning. Only a document that is not a JSON object at all is rejected.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The document body was not a JSON object keyed by profile name.
    #[error("policy document must be a JSON object, got {found}")]
    NotAnObject {
        /// JSON type name of the rejected document.
        found: &'static str,
    },

    /// The document text could not be parsed as JSON.
    #[error("policy document is not valid JSON: {source}")]
    Json {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
}

/// A raw governance document: profile name → topic → permission table.
#[derive(Clone, Debug)]
pub struct PolicyDocument {
    profiles: Map<String, Value>,
}

impl PolicyDocument {
    /// Wraps a parsed JSON document, stripping the reserved `comment` key.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::NotAnObject`] when the value is not an object.
    pub fn from_value(value: Value) -> PolicyResult<Self> {
        let Value::Object(mut profiles) = value else {
            return Err(PolicyError::NotAnObject {
                found: json_type_name(&value),
            });
        };
        profiles.remove(COMMENT_KEY);
        Ok(Self { profiles })
    }

    /// Parses a document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::Json`] on malformed JSON and
    /// [`PolicyError::NotAnObject`] when the root is not an object.
    pub fn from_json(text: &str) -> PolicyResult<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Returns the governance document bundled with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json(include_str!("default_policy.json")).expect("bundled policy document")
    }

    /// Returns `true` when the document defines the named profile.
    #[must_use]
    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.get(name).is_some_and(Value::is_object)
    }

    /// Flattens the named profile into a validated permission table.
    ///
    /// The `default` profile is merged as the base layer; topic keys from the
    /// named profile replace same-named keys entirely (shallow object-spread
    /// semantics, not a per-action deep merge). A name with no entry resolves
    /// to just the `default` layer. This never fails: every malformed leaf is
    /// coerced to `deny` with a warning.
    #[must_use]
    pub fn effective(&self, profile: &str) -> EffectivePolicy {
        let mut merged = self.profile_layer(DEFAULT_KEY);
        for (topic, value) in self.profile_layer(profile) {
            merged.insert(topic, value);
        }
        EffectivePolicy::from_merged(profile, merged)
    }

    fn profile_layer(&self, name: &str) -> Map<String, Value> {
        match self.profiles.get(name) {
            Some(Value::Object(topics)) => topics.clone(),
            Some(other) => {
                warn!(
                    profile = name,
                    found = json_type_name(other),
                    "policy profile is not an object, treating as empty"
                );
                Map::new()
            }
            None => Map::new(),
        }
    }
}

/// Permission rule attached to one topic of an effective policy.
///
/// Serializes back into the document shape: a bare permission string for
/// blanket rules, an action map otherwise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TopicRule {
    /// A single permission covering the whole topic; only the reserved
    /// `all` fallback topic carries this form after validation.
    Blanket(Permission),
    /// Per-action permissions.
    Actions(HashMap<String, Permission>),
}

/// The flattened, validated permission table for one policy profile.
///
/// Invariant: every reachable read resolves to a valid [`Permission`], and
/// the `all` fallback topic is always present.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct EffectivePolicy {
    topics: HashMap<String, TopicRule>,
}

/// Outcome of a table lookup, distinguishing concrete cells from fallback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lookup {
    /// An exact `topic.action` cell matched.
    Concrete(Permission),
    /// No exact cell; the `all` fallback applies.
    Fallback(Permission),
}

impl Lookup {
    pub(crate) const fn permission(self) -> Permission {
        match self {
            Self::Concrete(p) | Self::Fallback(p) => p,
        }
    }
}

impl EffectivePolicy {
    /// Validation pass over the merged topic map.
    ///
    /// - the `comment` topic is deleted;
    /// - `all` must hold a single permission string, else it resets to `deny`;
    /// - every other topic must hold an action map; malformed topic entries
    ///   are dropped and malformed action values reset to `deny`;
    /// - `all` is inserted as `deny` when missing entirely.
    fn from_merged(profile: &str, merged: Map<String, Value>) -> Self {
        let mut topics = HashMap::with_capacity(merged.len());

        for (topic, value) in merged {
            if topic == COMMENT_KEY {
                continue;
            }
            if topic == ALL_KEY {
                let permission = parse_permission(&value).unwrap_or_else(|| {
                    warn!(
                        profile,
                        value = %value,
                        "invalid fallback permission, resetting to deny"
                    );
                    Permission::Deny
                });
                topics.insert(topic, TopicRule::Blanket(permission));
                continue;
            }

            let Value::Object(actions) = value else {
                warn!(profile, topic, "malformed topic entry, ignoring");
                continue;
            };

            let mut table = HashMap::with_capacity(actions.len());
            for (action, raw) in actions {
                let permission = parse_permission(&raw).unwrap_or_else(|| {
                    warn!(
                        profile,
                        topic,
                        action,
                        value = %raw,
                        "invalid permission value, resetting to deny"
                    );
                    Permission::Deny
                });
                table.insert(action, permission);
            }
            topics.insert(topic, TopicRule::Actions(table));
        }

        topics
            .entry(ALL_KEY.to_owned())
            .or_insert(TopicRule::Blanket(Permission::Deny));

        Self { topics }
    }

    /// Returns the `all` fallback permission.
    #[must_use]
    pub fn fallback(&self) -> Permission {
        match self.topics.get(ALL_KEY) {
            Some(TopicRule::Blanket(permission)) => *permission,
            _ => Permission::Deny,
        }
    }

    /// Returns the rule stored for a topic, if any.
    #[must_use]
    pub fn topic(&self, topic: &str) -> Option<&TopicRule> {
        self.topics.get(topic)
    }

    /// Read-only resolution of `topic.action`.
    ///
    /// A request for the `all` topic itself resolves through the fallback
    /// branch, matching the lookup order of the permission engine.
    pub(crate) fn lookup(&self, topic: &str, action: &str) -> Lookup {
        if topic != ALL_KEY {
            if let Some(TopicRule::Actions(actions)) = self.topics.get(topic) {
                if let Some(permission) = actions.get(action) {
                    return Lookup::Concrete(*permission);
                }
            }
        }
        Lookup::Fallback(self.fallback())
    }

    /// Consuming resolution: a concrete `once` cell is rewritten to `deny`
    /// and its prior value returned. Fallback hits never mutate `all`.
    pub(crate) fn consume(&mut self, topic: &str, action: &str) -> Permission {
        if topic != ALL_KEY {
            if let Some(TopicRule::Actions(actions)) = self.topics.get_mut(topic) {
                if let Some(cell) = actions.get_mut(action) {
                    let current = *cell;
                    if current == Permission::Once {
                        *cell = Permission::Deny;
                    }
                    return current;
                }
            }
        }
        self.fallback()
    }
}

fn parse_permission(value: &Value) -> Option<Permission> {
    value.as_str().and_then(|text| text.parse().ok())
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
