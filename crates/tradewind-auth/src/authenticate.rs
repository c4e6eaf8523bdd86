//! Multi-scheme authentication
//!
//! Bearer-token and API-key credentials resolve through one step. Bearer
//! is attempted first; a present-but-invalid bearer token fails the
//! request rather than falling through to the API key, so exactly one
//! scheme's verdict applies per request.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use tradewind_core::PlatformResult;

use crate::principal::Principal;
use crate::token::BearerTokenValidator;
use crate::AuthenticationFailure;

/// Credentials extracted from an incoming request by the HTTP layer.
///
/// The HTTP layer reports which credential forms were present; this crate
/// never sees headers or query strings directly.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// Bearer token from the Authorization header, if any
    pub bearer: Option<String>,
    /// API key from the configured header or query parameter, if any
    pub api_key: Option<String>,
}

impl RequestCredentials {
    /// No credentials at all
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A bearer-token credential
    pub fn bearer(token: impl Into<String>) -> Self {
        RequestCredentials {
            bearer: Some(token.into()),
            api_key: None,
        }
    }

    /// An API-key credential
    pub fn api_key(key: impl Into<String>) -> Self {
        RequestCredentials {
            bearer: None,
            api_key: Some(key.into()),
        }
    }
}

/// External key-to-identity lookup for the API-key scheme
#[async_trait]
pub trait ApiKeyResolver: Send + Sync {
    /// Map an API key to its principal, `None` when the key is unknown
    async fn resolve(&self, key: &str) -> PlatformResult<Option<Principal>>;
}

/// Static key table, for tests and small installations
#[derive(Debug, Default)]
pub struct InMemoryApiKeyResolver {
    keys: HashMap<String, Principal>,
}

impl InMemoryApiKeyResolver {
    /// Create an empty resolver
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key and its identity
    pub fn with_key(mut self, key: impl Into<String>, principal: Principal) -> Self {
        self.keys.insert(key.into(), principal);
        self
    }
}

#[async_trait]
impl ApiKeyResolver for InMemoryApiKeyResolver {
    async fn resolve(&self, key: &str) -> PlatformResult<Option<Principal>> {
        Ok(self.keys.get(key).cloned())
    }
}

/// Resolves request credentials into an authenticated principal
pub struct MultiSchemeAuthenticator {
    bearer: BearerTokenValidator,
    api_keys: Arc<dyn ApiKeyResolver>,
}

impl MultiSchemeAuthenticator {
    /// Combine the bearer validator with an API-key backend
    pub fn new(bearer: BearerTokenValidator, api_keys: Arc<dyn ApiKeyResolver>) -> Self {
        MultiSchemeAuthenticator { bearer, api_keys }
    }

    /// Authenticate a request.
    ///
    /// Failure here means HTTP 401 at the boundary — an explicit status,
    /// never a login redirect.
    pub async fn authenticate(
        &self,
        credentials: &RequestCredentials,
    ) -> Result<Principal, AuthenticationFailure> {
        if let Some(token) = &credentials.bearer {
            let principal = self.bearer.validate(token)?;
            tracing::debug!(subject = principal.subject(), "authenticated via bearer token");
            return Ok(principal);
        }

        if let Some(key) = &credentials.api_key {
            let principal = self
                .api_keys
                .resolve(key)
                .await
                .map_err(|err| AuthenticationFailure::Backend {
                    message: err.to_string(),
                })?
                .ok_or(AuthenticationFailure::UnknownApiKey)?;
            tracing::debug!(subject = principal.subject(), "authenticated via API key");
            return Ok(principal);
        }

        Err(AuthenticationFailure::MissingCredentials)
    }
}
