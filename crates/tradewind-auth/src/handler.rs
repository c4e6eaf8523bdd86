//! Permission authorization handler
//!
//! Evaluates whether a principal's claims satisfy a required permission,
//! optionally narrowed to a scope. The restricted-role override runs
//! before any positive check: certain roles may never pass authorization
//! regardless of granted permissions, because authentication alone is
//! insufficient for permission-gated resources.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use tradewind_core::{PermissionScope, PlatformResult};

use crate::principal::{PermissionGrant, Principal};

/// Outcome of a permission evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The principal satisfies the requirement
    Allow,
    /// The principal does not; the reason is kept for audit
    Deny(DenyReason),
}

impl Decision {
    /// Whether the decision grants access
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Audit-level distinction between denial causes.
///
/// Both surface as HTTP 403 externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The principal carries a restricted role; hard override, evaluated
    /// before any permission check
    RestrictedRole,
    /// No grant (direct or role-derived) satisfies the requirement
    MissingPermission,
}

/// External role store resolving a role name to the permission grants it
/// implies. Implementations resolve role hierarchies internally; the
/// handler sees a flat grant list per role.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Grants implied by a role; unknown roles imply nothing
    async fn grants_for_role(&self, role: &str) -> PlatformResult<Vec<PermissionGrant>>;
}

/// Static role table, for tests and small installations
#[derive(Debug, Default)]
pub struct InMemoryRoleStore {
    roles: HashMap<String, Vec<PermissionGrant>>,
}

impl InMemoryRoleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a role's grants
    pub fn with_role(mut self, role: impl Into<String>, grants: Vec<PermissionGrant>) -> Self {
        self.roles.insert(role.into(), grants);
        self
    }
}

#[async_trait]
impl RoleStore for InMemoryRoleStore {
    async fn grants_for_role(&self, role: &str) -> PlatformResult<Vec<PermissionGrant>> {
        Ok(self.roles.get(role).cloned().unwrap_or_default())
    }
}

/// Evaluates principals against required permissions.
///
/// Stateless per call; safe to share across concurrent requests.
pub struct PermissionAuthorizationHandler {
    roles: Arc<dyn RoleStore>,
    restricted_roles: Vec<String>,
}

impl PermissionAuthorizationHandler {
    /// Create a handler over a role store and the restricted-role set
    pub fn new(roles: Arc<dyn RoleStore>, restricted_roles: Vec<String>) -> Self {
        PermissionAuthorizationHandler {
            roles,
            restricted_roles,
        }
    }

    /// Evaluate a permission requirement.
    ///
    /// Allow iff the principal holds a grant naming `permission` — directly
    /// or through a role — and, when `scope` is requested, the grant
    /// carries an exactly matching scope. Denials are values, not errors;
    /// the `Err` path is reserved for backend faults.
    pub async fn evaluate(
        &self,
        principal: &Principal,
        permission: &str,
        scope: Option<&PermissionScope>,
    ) -> PlatformResult<Decision> {
        if let Some(role) = principal
            .roles()
            .find(|r| self.restricted_roles.iter().any(|restricted| restricted == r))
        {
            tracing::debug!(
                subject = principal.subject(),
                role,
                "restricted role override denied access"
            );
            return Ok(Decision::Deny(DenyReason::RestrictedRole));
        }

        for grant in principal.permission_grants()? {
            if grant.satisfies(permission, scope) {
                return Ok(Decision::Allow);
            }
        }

        for role in principal.roles() {
            for grant in self.roles.grants_for_role(role).await? {
                if grant.satisfies(permission, scope) {
                    return Ok(Decision::Allow);
                }
            }
        }

        tracing::debug!(
            subject = principal.subject(),
            permission,
            scoped = scope.is_some(),
            "permission not granted"
        );
        Ok(Decision::Deny(DenyReason::MissingPermission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::principal::AuthScheme;

    fn handler() -> PermissionAuthorizationHandler {
        let roles = InMemoryRoleStore::new()
            .with_role(
                "order-manager",
                vec![
                    PermissionGrant::unscoped("orders:view"),
                    PermissionGrant::scoped(
                        "orders:cancel",
                        vec![PermissionScope::store("west")],
                    ),
                ],
            )
            .with_role("reader", vec![PermissionGrant::unscoped("catalog:view")]);
        PermissionAuthorizationHandler::new(Arc::new(roles), vec!["customer".to_string()])
    }

    #[tokio::test]
    async fn direct_grant_allows_unscoped_check() {
        let principal =
            Principal::new("alice", AuthScheme::Bearer).with_permission("catalog:update");
        let decision = handler()
            .evaluate(&principal, "catalog:update", None)
            .await
            .unwrap();
        assert_eq!(decision, Decision::Allow);
    }

    #[tokio::test]
    async fn unscoped_grant_denied_for_scoped_check() {
        let principal =
            Principal::new("alice", AuthScheme::Bearer).with_permission("catalog:update");
        let decision = handler()
            .evaluate(
                &principal,
                "catalog:update",
                Some(&PermissionScope::store("A")),
            )
            .await
            .unwrap();
        assert_eq!(decision, Decision::Deny(DenyReason::MissingPermission));
    }

    #[tokio::test]
    async fn scoped_grant_matrix() {
        let principal = Principal::new("p", AuthScheme::Bearer)
            .with_scoped_permission("orders:cancel", vec![PermissionScope::store("west")])
            .unwrap();
        let handler = handler();

        let west = handler
            .evaluate(
                &principal,
                "orders:cancel",
                Some(&PermissionScope::store("west")),
            )
            .await
            .unwrap();
        assert_eq!(west, Decision::Allow);

        let east = handler
            .evaluate(
                &principal,
                "orders:cancel",
                Some(&PermissionScope::store("east")),
            )
            .await
            .unwrap();
        assert_eq!(east, Decision::Deny(DenyReason::MissingPermission));

        let view = handler
            .evaluate(&principal, "orders:view", None)
            .await
            .unwrap();
        assert_eq!(view, Decision::Deny(DenyReason::MissingPermission));
    }

    #[tokio::test]
    async fn role_derived_grants_allow() {
        let principal = Principal::new("bob", AuthScheme::Bearer).with_role("order-manager");
        let handler = handler();

        assert_eq!(
            handler
                .evaluate(&principal, "orders:view", None)
                .await
                .unwrap(),
            Decision::Allow
        );
        assert_eq!(
            handler
                .evaluate(
                    &principal,
                    "orders:cancel",
                    Some(&PermissionScope::store("west"))
                )
                .await
                .unwrap(),
            Decision::Allow
        );
        assert_eq!(
            handler
                .evaluate(
                    &principal,
                    "orders:cancel",
                    Some(&PermissionScope::store("east"))
                )
                .await
                .unwrap(),
            Decision::Deny(DenyReason::MissingPermission)
        );
    }

    #[tokio::test]
    async fn restricted_role_is_denied_regardless_of_grants() {
        let principal = Principal::new("eve", AuthScheme::Bearer)
            .with_role("customer")
            .with_role("order-manager")
            .with_permission("orders:view");
        let decision = handler()
            .evaluate(&principal, "orders:view", None)
            .await
            .unwrap();
        assert_eq!(decision, Decision::Deny(DenyReason::RestrictedRole));
    }
}
