//! Unified error handling
//!
//! Boot-time failures (lock timeouts, duplicate permission registrations,
//! failed bootstrap steps, bad configuration) are fatal by policy: the
//! instance must not begin serving. Request-time authorization denials are
//! *not* errors; they are ordinary decision values and live in the auth
//! crate.

use thiserror::Error;

/// Unified platform error type
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Distributed lock acquisition exceeded its timeout. Another instance
    /// is legitimately running the critical section; retry happens by
    /// restarting the instance, not by an internal loop.
    #[error("Lock timeout: {message}")]
    LockTimeout {
        /// Description of the lock acquisition that timed out
        message: String,
    },

    /// A non-owner attempted to renew or release a held lock. Indicates a
    /// bug, not contention.
    #[error("Lock ownership violation: {message}")]
    LockOwnership {
        /// Description of the offending operation
        message: String,
    },

    /// A bootstrap step failed; startup must abort
    #[error("Bootstrap step '{step}' failed: {message}")]
    BootstrapStep {
        /// Name of the failing step
        step: String,
        /// Underlying failure description
        message: String,
    },

    /// Two modules registered the same permission identifier
    #[error("Duplicate permission '{id}': already registered by module '{owner}', re-registered by '{module}'")]
    DuplicatePermission {
        /// The contested permission identifier
        id: String,
        /// Module that registered it first
        owner: String,
        /// Module that attempted the duplicate registration
        module: String,
    },

    /// A policy name was requested that matches no registered permission
    #[error("Unknown authorization policy '{name}': no such permission is registered")]
    UnknownPolicy {
        /// The unresolvable policy name
        name: String,
    },

    /// Invalid or unloadable configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// Credential validation failure surfaced by a store or validator.
    /// Distinct from an ordinary 401 outcome: this is an infrastructure
    /// fault (e.g. the key store is unreachable), not a bad credential.
    #[error("Authentication backend error: {message}")]
    Authentication {
        /// Description of the backend failure
        message: String,
    },

    /// Serialization or deserialization failure
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure
        message: String,
    },
}

impl PlatformError {
    /// Invalid-configuration convenience constructor
    pub fn config(message: impl Into<String>) -> Self {
        PlatformError::Config {
            message: message.into(),
        }
    }

    /// Serialization-failure convenience constructor
    pub fn serialization(message: impl Into<String>) -> Self {
        PlatformError::Serialization {
            message: message.into(),
        }
    }

    /// True for errors that must terminate instance startup
    pub fn is_fatal_at_boot(&self) -> bool {
        matches!(
            self,
            PlatformError::LockTimeout { .. }
                | PlatformError::LockOwnership { .. }
                | PlatformError::BootstrapStep { .. }
                | PlatformError::DuplicatePermission { .. }
                | PlatformError::Config { .. }
        )
    }
}

impl From<serde_json::Error> for PlatformError {
    fn from(err: serde_json::Error) -> Self {
        PlatformError::serialization(err.to_string())
    }
}

/// Result alias used across platform crates
pub type PlatformResult<T> = Result<T, PlatformError>;
