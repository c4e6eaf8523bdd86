//! Principals, claims and permission grants

use serde::{Deserialize, Serialize};

use tradewind_core::{PermissionScope, PlatformResult};

/// Claim type identifiers
pub mod claims {
    /// Role membership claim
    pub const ROLE: &str = "role";
    /// Permission grant claim; the value is a [`super::PermissionGrant`]
    /// in its textual encoding
    pub const PERMISSION: &str = "permission";
}

/// Which credential scheme produced a principal.
///
/// Exactly one scheme is used per request; results are never merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    /// Bearer token in the Authorization header
    Bearer,
    /// API key in a header or query parameter
    ApiKey,
}

/// A single (type, value) claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim type, one of the [`claims`] constants
    pub kind: String,
    /// Claim value
    pub value: String,
}

/// A permission grant carried in a claim value.
///
/// Textual encoding: the bare permission identifier, or
/// `"<permission>|<scopes-json>"` where the scopes are a JSON array in the
/// `Type`-tagged wire form. A grant with no scopes satisfies only unscoped
/// checks; a scoped check passes only when the grant carries an exactly
/// matching scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionGrant {
    /// Granted permission identifier
    pub permission: String,
    /// Partitions the grant is narrowed to; empty means unscoped
    pub scopes: Vec<PermissionScope>,
}

impl PermissionGrant {
    /// An unscoped grant
    pub fn unscoped(permission: impl Into<String>) -> Self {
        PermissionGrant {
            permission: permission.into(),
            scopes: Vec::new(),
        }
    }

    /// A grant narrowed to the given scopes
    pub fn scoped(permission: impl Into<String>, scopes: Vec<PermissionScope>) -> Self {
        PermissionGrant {
            permission: permission.into(),
            scopes,
        }
    }

    /// Whether this grant satisfies a permission check.
    ///
    /// Unscoped checks need only the permission identifier; scoped checks
    /// additionally need an exact scope match (type and value, no
    /// wildcards).
    pub fn satisfies(&self, permission: &str, scope: Option<&PermissionScope>) -> bool {
        if self.permission != permission {
            return false;
        }
        match scope {
            None => true,
            Some(requested) => self.scopes.iter().any(|s| s.matches(requested)),
        }
    }

    /// Render the claim-value encoding
    pub fn encode(&self) -> PlatformResult<String> {
        if self.scopes.is_empty() {
            return Ok(self.permission.clone());
        }
        let scopes = serde_json::to_string(&self.scopes)?;
        Ok(format!("{}|{scopes}", self.permission))
    }

    /// Parse the claim-value encoding
    pub fn parse(value: &str) -> PlatformResult<Self> {
        match value.split_once('|') {
            None => Ok(PermissionGrant::unscoped(value)),
            Some((permission, scopes)) => Ok(PermissionGrant {
                permission: permission.to_string(),
                scopes: serde_json::from_str(scopes)?,
            }),
        }
    }
}

/// The authenticated caller: a claim set derived from exactly one
/// credential scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    subject: String,
    scheme: AuthScheme,
    claims: Vec<Claim>,
}

impl Principal {
    /// Create a principal with no claims
    pub fn new(subject: impl Into<String>, scheme: AuthScheme) -> Self {
        Principal {
            subject: subject.into(),
            scheme,
            claims: Vec::new(),
        }
    }

    /// Stable identity of the caller
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Scheme that authenticated this principal
    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    /// All claims
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// Append an arbitrary claim
    pub fn with_claim(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim {
            kind: kind.into(),
            value: value.into(),
        });
        self
    }

    /// Append a role claim
    pub fn with_role(self, role: impl Into<String>) -> Self {
        self.with_claim(claims::ROLE, role)
    }

    /// Append an unscoped permission claim
    pub fn with_permission(self, permission: impl Into<String>) -> Self {
        self.with_claim(claims::PERMISSION, permission.into())
    }

    /// Append a scoped permission claim
    pub fn with_scoped_permission(
        self,
        permission: impl Into<String>,
        scopes: Vec<PermissionScope>,
    ) -> PlatformResult<Self> {
        let encoded = PermissionGrant::scoped(permission, scopes).encode()?;
        Ok(self.with_claim(claims::PERMISSION, encoded))
    }

    /// Role claim values
    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.claims
            .iter()
            .filter(|c| c.kind == claims::ROLE)
            .map(|c| c.value.as_str())
    }

    /// Whether the principal carries the given role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles().any(|r| r == role)
    }

    /// Parsed permission grants from the principal's own claims
    pub fn permission_grants(&self) -> PlatformResult<Vec<PermissionGrant>> {
        self.claims
            .iter()
            .filter(|c| c.kind == claims::PERMISSION)
            .map(|c| PermissionGrant::parse(&c.value))
            .collect()
    }
}
