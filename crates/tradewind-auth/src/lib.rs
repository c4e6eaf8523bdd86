//! Tradewind Auth
//!
//! Request-time security for the platform host, in two halves:
//!
//! - **Authentication** — [`MultiSchemeAuthenticator`] resolves a request's
//!   credentials (bearer token or API key, never both) into a
//!   [`Principal`]. Failures are ordinary 401 outcomes, never redirects.
//! - **Authorization** — [`PermissionPolicyProvider`] synthesizes policies
//!   on demand for the runtime-discovered permission vocabulary, and
//!   [`PermissionAuthorizationHandler`] evaluates a principal's claims
//!   against a required permission and optional scope.
//!
//! Evaluation is stateless per call: the only shared state is the
//! read-only permission registry snapshot frozen at boot.

#![allow(missing_docs)]
#![forbid(unsafe_code)]

pub mod authenticate;
pub mod handler;
pub mod policy;
pub mod principal;
pub mod token;

pub use authenticate::{
    ApiKeyResolver, InMemoryApiKeyResolver, MultiSchemeAuthenticator, RequestCredentials,
};
pub use handler::{
    Decision, DenyReason, InMemoryRoleStore, PermissionAuthorizationHandler, RoleStore,
};
pub use policy::{AuthorizationPolicy, PermissionPolicyProvider};
pub use principal::{claims, AuthScheme, Claim, PermissionGrant, Principal};
pub use token::{encode_token, BearerTokenValidator, TokenClaims};

/// Why an authentication attempt produced no principal.
///
/// Every variant surfaces as HTTP 401 at the host boundary; the
/// distinctions exist for logs and audit, not for the wire.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationFailure {
    /// Neither a bearer token nor an API key was presented
    #[error("no credentials presented")]
    MissingCredentials,

    /// The bearer token is structurally invalid
    #[error("malformed bearer token: {reason}")]
    MalformedToken {
        /// What was wrong with the token
        reason: String,
    },

    /// Signature verification failed
    #[error("bearer token signature is invalid")]
    InvalidSignature,

    /// The token's lifetime has ended
    #[error("bearer token is expired")]
    Expired,

    /// The token's audience does not match the platform's
    #[error("bearer token audience mismatch")]
    WrongAudience,

    /// The token's issuer failed the configured validation mode
    #[error("bearer token issuer rejected")]
    WrongIssuer,

    /// The presented API key maps to no identity
    #[error("unknown API key")]
    UnknownApiKey,

    /// The credential backend itself failed
    #[error("credential backend error: {message}")]
    Backend {
        /// Backend failure description
        message: String,
    },
}
