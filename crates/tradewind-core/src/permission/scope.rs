//! Permission scopes
//!
//! A scope narrows a permission grant to a data partition (a store, a
//! catalog). Scopes cross the wire as a single polymorphic shape selected
//! by an explicit `Type` tag, so heterogeneous scope subtypes deserialize
//! from one representation.

use serde::{Deserialize, Serialize};

/// A typed qualifier narrowing a permission to a subset of data.
///
/// Closed set of known scope kinds plus an open extension variant for
/// third-party modules. Matching is exact on type and value; there is no
/// wildcard or hierarchy matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type")]
pub enum PermissionScope {
    /// Scoped to a single store
    Store {
        /// Store identifier
        store_id: String,
    },

    /// Scoped to a single catalog
    Catalog {
        /// Catalog identifier
        catalog_id: String,
    },

    /// Extension point for module-defined scope kinds
    Custom {
        /// Discriminator of the module-defined scope kind
        scope_type: String,
        /// Opaque scope value, compared verbatim
        value: String,
    },
}

impl PermissionScope {
    /// Scope type discriminator, as carried in the `Type` wire tag
    pub fn scope_type(&self) -> &str {
        match self {
            PermissionScope::Store { .. } => "Store",
            PermissionScope::Catalog { .. } => "Catalog",
            PermissionScope::Custom { scope_type, .. } => scope_type,
        }
    }

    /// The partition identifier this scope names
    pub fn value(&self) -> &str {
        match self {
            PermissionScope::Store { store_id } => store_id,
            PermissionScope::Catalog { catalog_id } => catalog_id,
            PermissionScope::Custom { value, .. } => value,
        }
    }

    /// Exact match on scope type and value
    pub fn matches(&self, other: &PermissionScope) -> bool {
        self.scope_type() == other.scope_type() && self.value() == other.value()
    }

    /// Convenience constructor for a store scope
    pub fn store(store_id: impl Into<String>) -> Self {
        PermissionScope::Store {
            store_id: store_id.into(),
        }
    }

    /// Convenience constructor for a catalog scope
    pub fn catalog(catalog_id: impl Into<String>) -> Self {
        PermissionScope::Catalog {
            catalog_id: catalog_id.into(),
        }
    }
}
