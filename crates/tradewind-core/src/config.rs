//! Platform configuration
//!
//! Loaded once from a TOML file before bootstrap, validated eagerly so a
//! misconfigured instance fails before touching the distributed lock.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, PlatformResult};

/// Top-level platform configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Distributed lock tuning
    #[serde(default)]
    pub lock: LockOptions,

    /// Authentication surface
    #[serde(default)]
    pub auth: AuthOptions,

    /// Role-based access rules
    #[serde(default)]
    pub security: SecurityOptions,
}

impl PlatformConfig {
    /// Load and validate a configuration file
    pub fn load_from_file(path: &Path) -> PlatformResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            PlatformError::config(format!("cannot read {}: {err}", path.display()))
        })?;
        let config: PlatformConfig = toml::from_str(&content)
            .map_err(|err| PlatformError::config(format!("invalid TOML: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> PlatformResult<()> {
        self.lock.validate()?;
        self.auth.validate()?;
        self.security.validate()
    }
}

/// Distributed lock tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockOptions {
    /// Lease time-to-live in seconds; a crashed holder frees the lock
    /// after this long
    #[serde(default = "default_lease_ttl_secs")]
    pub lease_ttl_secs: u64,

    /// How long an instance waits for the bootstrap lock before failing
    /// its own startup
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Polling interval while waiting for a held lock
    #[serde(default = "default_retry_interval_millis")]
    pub retry_interval_millis: u64,
}

fn default_lease_ttl_secs() -> u64 {
    30
}

fn default_acquire_timeout_secs() -> u64 {
    600
}

fn default_retry_interval_millis() -> u64 {
    500
}

impl Default for LockOptions {
    fn default() -> Self {
        LockOptions {
            lease_ttl_secs: default_lease_ttl_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            retry_interval_millis: default_retry_interval_millis(),
        }
    }
}

impl LockOptions {
    /// Lease TTL as a [`Duration`]
    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }

    /// Acquisition timeout as a [`Duration`]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// Retry interval as a [`Duration`]
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_millis)
    }

    fn validate(&self) -> PlatformResult<()> {
        if self.lease_ttl_secs == 0 {
            return Err(PlatformError::config("lock.lease_ttl_secs must be > 0"));
        }
        if self.retry_interval_millis == 0 {
            return Err(PlatformError::config(
                "lock.retry_interval_millis must be > 0",
            ));
        }
        Ok(())
    }
}

/// Issuer validation mode for bearer tokens.
///
/// Selected by configuration, never auto-detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IssuerValidation {
    /// Exact single-issuer comparison
    Standard {
        /// The one accepted issuer
        issuer: String,
    },

    /// Multi-tenant wildcard mode: the issuer is accepted when it matches
    /// a template with a `{tenant}` placeholder segment
    MultitenantWildcard {
        /// Issuer template, e.g. `https://login.example.com/{tenant}/v2.0`
        template: String,
    },

    /// Issuer not checked
    Disabled,
}

impl Default for IssuerValidation {
    fn default() -> Self {
        IssuerValidation::Disabled
    }
}

/// Placeholder segment recognized in wildcard issuer templates
pub const TENANT_PLACEHOLDER: &str = "{tenant}";

/// Authentication configuration consumed by the multi-scheme authenticator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthOptions {
    /// Expected token audience
    #[serde(default)]
    pub audience: String,

    /// Hex-encoded HMAC signing key for bearer token validation
    #[serde(default)]
    pub signing_key_hex: String,

    /// Issuer validation mode
    #[serde(default)]
    pub issuer: IssuerValidation,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_token_lifetime_secs")]
    pub access_token_lifetime_secs: u64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_token_lifetime_secs")]
    pub refresh_token_lifetime_secs: u64,

    /// Header name carrying an API key credential
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Query parameter name carrying an API key credential
    #[serde(default = "default_api_key_query")]
    pub api_key_query: String,
}

fn default_access_token_lifetime_secs() -> u64 {
    3600
}

fn default_refresh_token_lifetime_secs() -> u64 {
    60 * 60 * 24 * 30
}

fn default_api_key_header() -> String {
    "api_key".to_string()
}

fn default_api_key_query() -> String {
    "api_key".to_string()
}

impl Default for AuthOptions {
    fn default() -> Self {
        AuthOptions {
            audience: String::new(),
            signing_key_hex: String::new(),
            issuer: IssuerValidation::default(),
            access_token_lifetime_secs: default_access_token_lifetime_secs(),
            refresh_token_lifetime_secs: default_refresh_token_lifetime_secs(),
            api_key_header: default_api_key_header(),
            api_key_query: default_api_key_query(),
        }
    }
}

impl AuthOptions {
    /// Decoded HMAC signing key
    pub fn signing_key(&self) -> PlatformResult<Vec<u8>> {
        hex::decode(&self.signing_key_hex)
            .map_err(|err| PlatformError::config(format!("auth.signing_key_hex: {err}")))
    }

    /// Access token lifetime as a [`Duration`]
    pub fn access_token_lifetime(&self) -> Duration {
        Duration::from_secs(self.access_token_lifetime_secs)
    }

    /// Refresh token lifetime as a [`Duration`]
    pub fn refresh_token_lifetime(&self) -> Duration {
        Duration::from_secs(self.refresh_token_lifetime_secs)
    }

    fn validate(&self) -> PlatformResult<()> {
        if self.signing_key_hex.is_empty() {
            return Err(PlatformError::config(
                "auth.signing_key_hex must be set: bearer validation needs a key",
            ));
        }
        self.signing_key()?;
        if let IssuerValidation::MultitenantWildcard { template } = &self.issuer {
            if !template.contains(TENANT_PLACEHOLDER) {
                return Err(PlatformError::config(format!(
                    "auth.issuer.template must contain '{TENANT_PLACEHOLDER}'"
                )));
            }
        }
        if self.access_token_lifetime_secs == 0 {
            return Err(PlatformError::config(
                "auth.access_token_lifetime_secs must be > 0",
            ));
        }
        Ok(())
    }
}

/// Role-based access rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityOptions {
    /// Roles that may never pass authorization regardless of granted
    /// permissions. End customers can obtain tokens but cannot call
    /// permission-gated APIs.
    #[serde(default = "default_restricted_roles")]
    pub restricted_roles: Vec<String>,
}

fn default_restricted_roles() -> Vec<String> {
    vec!["customer".to_string()]
}

impl Default for SecurityOptions {
    fn default() -> Self {
        SecurityOptions {
            restricted_roles: default_restricted_roles(),
        }
    }
}

impl SecurityOptions {
    fn validate(&self) -> PlatformResult<()> {
        if self.restricted_roles.iter().any(|r| r.is_empty()) {
            return Err(PlatformError::config(
                "security.restricted_roles must not contain empty names",
            ));
        }
        Ok(())
    }
}
