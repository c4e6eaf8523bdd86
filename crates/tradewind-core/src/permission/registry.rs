//! Boot-time permission registry
//!
//! The registry is built additively while modules are discovered inside the
//! bootstrap critical section, then frozen. The builder/snapshot split makes
//! the write-once lifecycle structural: the serving phase only ever sees the
//! immutable [`PermissionRegistry`], so no runtime guard is needed.

use std::collections::BTreeMap;

use crate::error::{PlatformError, PlatformResult};
use crate::permission::Permission;

/// Additive, boot-phase-only collector of module permissions.
#[derive(Debug, Default)]
pub struct PermissionRegistryBuilder {
    entries: BTreeMap<String, Permission>,
    owners: BTreeMap<String, String>,
}

impl PermissionRegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module's permission contribution.
    ///
    /// A permission identifier already claimed by another module is a fatal
    /// configuration error: two modules would share one access-control
    /// identity. Registering the exact same permission twice from the same
    /// module is equally rejected, since it indicates a wiring mistake.
    pub fn register(
        &mut self,
        module_id: &str,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> PlatformResult<()> {
        for permission in permissions {
            if let Some(owner) = self.owners.get(&permission.id) {
                return Err(PlatformError::DuplicatePermission {
                    id: permission.id,
                    owner: owner.clone(),
                    module: module_id.to_string(),
                });
            }
            tracing::debug!(
                module = module_id,
                permission = %permission.id,
                "registered permission"
            );
            self.owners
                .insert(permission.id.clone(), module_id.to_string());
            self.entries.insert(permission.id.clone(), permission);
        }
        Ok(())
    }

    /// Number of permissions collected so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze into the immutable serving-phase registry
    pub fn build(self) -> PermissionRegistry {
        PermissionRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable process-wide permission catalog.
///
/// Read by the policy provider on every policy synthesis; never mutated
/// after boot.
#[derive(Debug, Clone)]
pub struct PermissionRegistry {
    entries: BTreeMap<String, Permission>,
}

impl PermissionRegistry {
    /// Look up a permission by identifier
    pub fn find(&self, id: &str) -> Option<&Permission> {
        self.entries.get(id)
    }

    /// Whether the identifier names a registered permission
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All registered permissions, in identifier order
    pub fn all(&self) -> impl Iterator<Item = &Permission> {
        self.entries.values()
    }

    /// Number of registered permissions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn register_and_find() {
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
        builder
            .register("catalog", [Permission::new("catalog:update")])
            .unwrap();

        let registry = builder.build();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("orders:cancel"));
        assert!(registry.find("orders:missing").is_none());
        assert!(registry
            .find("orders:cancel")
            .is_some_and(|p| p.accepts_scope_type("Store")));
    }

    #[test]
    fn duplicate_across_modules_is_fatal() {
        let mut builder = PermissionRegistryBuilder::new();
        builder
            .register("orders", [Permission::new("orders:cancel")])
            .unwrap();

        let err = builder
            .register("legacy-orders", [Permission::new("orders:cancel")])
            .unwrap_err();
        assert_matches!(
            err,
            PlatformError::DuplicatePermission { id, owner, module } => {
                assert_eq!(id, "orders:cancel");
                assert_eq!(owner, "orders");
                assert_eq!(module, "legacy-orders");
            }
        );
    }

    #[test]
    fn duplicate_within_one_module_is_fatal() {
        let mut builder = PermissionRegistryBuilder::new();
        let err = builder
            .register(
                "orders",
                [Permission::new("orders:view"), Permission::new("orders:view")],
            )
            .unwrap_err();
        assert_matches!(err, PlatformError::DuplicatePermission { .. });
    }

    #[test]
    fn iteration_is_ordered_by_identifier() {
        let mut builder = PermissionRegistryBuilder::new();
        builder
            .register(
                "platform",
                [
                    Permission::new("platform:update-settings"),
                    Permission::new("platform:manage-modules"),
                ],
            )
            .unwrap();
        let registry = builder.build();
        let ids: Vec<_> = registry.all().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["platform:manage-modules", "platform:update-settings"]);
    }
}
