//! On-demand authorization policy synthesis
//!
//! Policies are not declared in a static table. Any policy name that
//! matches a registered permission identifier is valid; the provider
//! synthesizes the policy on lookup. Unknown names fail fast as a
//! configuration error rather than silently granting or denying.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use tradewind_core::{PermissionRegistry, PlatformError, PlatformResult};

use crate::principal::AuthScheme;

/// A synthesized, request-scoped authorization policy.
///
/// Never persisted; pairs the required permission with the authentication
/// schemes eligible to satisfy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationPolicy {
    /// Permission the caller must hold
    pub permission: String,
    /// Schemes whose principals may satisfy the policy
    pub schemes: Vec<AuthScheme>,
    /// Scope types the permission may be narrowed by
    pub scope_types: Vec<String>,
}

/// Synthesizes policies for the runtime-discovered permission vocabulary.
///
/// Deterministic for a fixed registry snapshot; the memo cache is a
/// performance nicety, not load-bearing.
pub struct PermissionPolicyProvider {
    registry: Arc<PermissionRegistry>,
    cache: RwLock<HashMap<String, Arc<AuthorizationPolicy>>>,
}

impl PermissionPolicyProvider {
    /// Create a provider over the frozen registry snapshot
    pub fn new(registry: Arc<PermissionRegistry>) -> Self {
        PermissionPolicyProvider {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a policy name.
    ///
    /// Returns [`PlatformError::UnknownPolicy`] when the name matches no
    /// registered permission; the caller surfaces that as a configuration
    /// error, not a denial.
    pub fn get_policy(&self, name: &str) -> PlatformResult<Arc<AuthorizationPolicy>> {
        if let Some(policy) = self.cache.read().get(name) {
            return Ok(policy.clone());
        }

        let permission = self
            .registry
            .find(name)
            .ok_or_else(|| PlatformError::UnknownPolicy {
                name: name.to_string(),
            })?;

        let policy = Arc::new(AuthorizationPolicy {
            permission: permission.id.clone(),
            schemes: vec![AuthScheme::Bearer, AuthScheme::ApiKey],
            scope_types: permission.scope_types.clone(),
        });
        self.cache
            .write()
            .insert(name.to_string(), policy.clone());
        Ok(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tradewind_core::{Permission, PermissionRegistryBuilder};

    fn provider() -> PermissionPolicyProvider {
        let mut builder = PermissionRegistryBuilder::new();
        builder
            .register(
                "orders",
                [
                    Permission::new("orders:view"),
                    Permission::new("orders:cancel").with_scope_type("Store"),
                ],
            )
            .unwrap();
        PermissionPolicyProvider::new(Arc::new(builder.build()))
    }

    #[test]
    fn registered_permission_synthesizes_policy() {
        let provider = provider();
        let policy = provider.get_policy("orders:cancel").unwrap();
        assert_eq!(policy.permission, "orders:cancel");
        assert_eq!(policy.schemes, [AuthScheme::Bearer, AuthScheme::ApiKey]);
        assert_eq!(policy.scope_types, ["Store"]);
    }

    #[test]
    fn unknown_name_fails_fast() {
        let provider = provider();
        assert_matches!(
            provider.get_policy("orders:refund"),
            Err(PlatformError::UnknownPolicy { name }) => {
                assert_eq!(name, "orders:refund");
            }
        );
    }

    #[test]
    fn lookups_are_deterministic_and_idempotent() {
        let provider = provider();
        let first = provider.get_policy("orders:view").unwrap();
        let second = provider.get_policy("orders:view").unwrap();
        assert_eq!(first, second);
        // Second hit comes from the memo cache and is the same allocation.
        assert!(Arc::ptr_eq(&first, &second));
    }
}
