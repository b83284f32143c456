//! Process-wide cache of governance engines keyed by profile name.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::document::PolicyDocument;
use crate::engine::GovernanceEngine;

/// Lazily-populated registry mapping profile name → engine instance.
///
/// One engine per profile is created on first request and reused for the
/// life of the process, so single-use permission consumption persists across
/// webhook deliveries. Construct one registry at startup and inject it into
/// the dispatcher; it deliberately replaces ambient global state.
pub struct GovernanceRegistry {
    document: PolicyDocument,
    engines: RwLock<HashMap<String, Arc<GovernanceEngine>>>,
}

impl GovernanceRegistry {
    /// Creates a registry backed by the supplied policy document.
    #[must_use]
    pub fn new(document: PolicyDocument) -> Self {
        Self {
            document,
            engines: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a registry over the bundled policy document.
    #[must_use]
    pub fn with_builtin_document() -> Self {
        Self::new(PolicyDocument::builtin())
    }

    /// Returns the engine for a profile, creating it on first request.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock has been poisoned.
    #[must_use]
    pub fn engine(&self, profile: &str) -> Arc<GovernanceEngine> {
        if let Some(engine) = self
            .engines
            .read()
            .expect("engine registry poisoned")
            .get(profile)
        {
            return Arc::clone(engine);
        }

        let mut guard = self.engines.write().expect("engine registry poisoned");
        // A concurrent caller may have won the race between the locks.
        if let Some(engine) = guard.get(profile) {
            return Arc::clone(engine);
        }

        debug!(profile, "creating governance engine");
        let engine = Arc::new(GovernanceEngine::new(&self.document, profile));
        guard.insert(profile.to_owned(), Arc::clone(&engine));
        engine
    }

    /// Returns the backing policy document.
    #[must_use]
    pub fn document(&self) -> &PolicyDocument {
        &self.document
    }
}

impl std::fmt::Debug for GovernanceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let engines = self.engines.read().expect("engine registry poisoned");
        let profiles: Vec<_> = engines.keys().cloned().collect();
        f.debug_struct("GovernanceRegistry")
            .field("profiles", &profiles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use governor_primitives::Permission;
    use serde_json::json;

    use super::*;

    #[test]
    fn caches_one_engine_per_profile() {
        let document = PolicyDocument::from_value(json!({
            "demo": {"all": "deny", "connections": {"accept-invitation": "once"}}
        }))
        .expect("document");
        let registry = GovernanceRegistry::new(document);

        let first = registry.engine("demo");
        assert_eq!(
            first.read_permission("connections", "accept-invitation"),
            Permission::Once
        );

        // The second request must observe the consumption above.
        let second = registry.engine("demo");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            second.read_permission("connections", "accept-invitation"),
            Permission::Deny
        );
    }

    #[test]
    fn distinct_profiles_get_distinct_engines() {
        let registry = GovernanceRegistry::with_builtin_document();
        let permissive = registry.engine("permissive");
        let default = registry.engine("default");

        assert!(!Arc::ptr_eq(&permissive, &default));
        assert_eq!(
            permissive.peek_permission("connections", "accept-invitation"),
            Permission::Always
        );
        assert_eq!(
            default.peek_permission("connections", "accept-invitation"),
            Permission::Deny
        );
    }
}
