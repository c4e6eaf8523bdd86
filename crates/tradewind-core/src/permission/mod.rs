//! Permission vocabulary
//!
//! Permissions are contributed by feature modules at boot. Identifiers
//! follow the `"<module>:<action>"` convention and are globally unique;
//! uniqueness is enforced by the [`registry`].

pub mod registry;
pub mod scope;

pub use registry::{PermissionRegistry, PermissionRegistryBuilder};
pub use scope::PermissionScope;

use serde::{Deserialize, Serialize};

/// A named capability an authorization policy can require.
///
/// Created during module discovery at boot and immutable for the process
/// lifetime; owned exclusively by the [`PermissionRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Globally unique identifier, `"<module>:<action>"`
    pub id: String,

    /// Display group for administrative UIs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// Scope type discriminators this permission may be narrowed by.
    /// Empty means the permission is only ever checked unscoped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope_types: Vec<String>,
}

impl Permission {
    /// Create an unscoped permission
    pub fn new(id: impl Into<String>) -> Self {
        Permission {
            id: id.into(),
            group: None,
            scope_types: Vec::new(),
        }
    }

    /// Set the display group
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Declare a scope type this permission accepts
    pub fn with_scope_type(mut self, scope_type: impl Into<String>) -> Self {
        self.scope_types.push(scope_type.into());
        self
    }

    /// The owning module, i.e. the segment before the first `:`
    pub fn module(&self) -> Option<&str> {
        self.id.split_once(':').map(|(module, _)| module)
    }

    /// Whether a scope of the given type may qualify this permission
    pub fn accepts_scope_type(&self, scope_type: &str) -> bool {
        self.scope_types.iter().any(|t| t == scope_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_prefix_extraction() {
        let perm = Permission::new("orders:cancel");
        assert_eq!(perm.module(), Some("orders"));

        let bare = Permission::new("cancel");
        assert_eq!(bare.module(), None);
    }

    #[test]
    fn scope_type_acceptance() {
        let perm = Permission::new("catalog:update").with_scope_type("Store");
        assert!(perm.accepts_scope_type("Store"));
        assert!(!perm.accepts_scope_type("Catalog"));
    }
}
