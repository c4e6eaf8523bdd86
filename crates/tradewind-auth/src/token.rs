//! Bearer token validation
//!
//! Compact HS256 tokens (`header.claims.signature`, base64url without
//! padding). Token *issuance* belongs to the external identity provider;
//! this module only validates what arrives, plus an [`encode_token`]
//! helper for tooling and tests.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use tradewind_core::config::TENANT_PLACEHOLDER;
use tradewind_core::{AuthOptions, IssuerValidation, PlatformResult};

use crate::principal::{claims, AuthScheme, Principal};
use crate::AuthenticationFailure;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

/// Claims carried by a bearer token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the caller's stable identity
    pub sub: String,

    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,

    /// Expiry, seconds since the Unix epoch
    pub exp: i64,

    /// Issued-at, seconds since the Unix epoch
    pub iat: i64,

    /// Role memberships
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    /// Permission grants in their claim-value encoding
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
}

/// Serialize and sign a token. Used by tests and operational tooling; the
/// platform itself never issues tokens.
pub fn encode_token(key: &[u8], token_claims: &TokenClaims) -> PlatformResult<String> {
    let header = TokenHeader {
        alg: "HS256".to_string(),
        typ: "JWT".to_string(),
    };
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(token_claims)?);

    let mut mac = HmacSha256::new_from_slice(key).map_err(|err| {
        tradewind_core::PlatformError::config(format!("invalid signing key: {err}"))
    })?;
    mac.update(format!("{header}.{body}").as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{header}.{body}.{signature}"))
}

/// Validates bearer tokens against the configured key, audience and
/// issuer policy.
#[derive(Debug)]
pub struct BearerTokenValidator {
    key: Vec<u8>,
    audience: String,
    issuer: IssuerValidation,
}

impl BearerTokenValidator {
    /// Build a validator from the authentication options
    pub fn from_options(options: &AuthOptions) -> PlatformResult<Self> {
        Ok(BearerTokenValidator {
            key: options.signing_key()?,
            audience: options.audience.clone(),
            issuer: options.issuer.clone(),
        })
    }

    /// Validate a compact token and derive the principal it asserts
    pub fn validate(&self, token: &str) -> Result<Principal, AuthenticationFailure> {
        let (header_b64, body_b64, signature_b64) = split_compact(token)?;

        let header: TokenHeader = decode_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(AuthenticationFailure::MalformedToken {
                reason: format!("unsupported algorithm '{}'", header.alg),
            });
        }

        let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|_| {
            AuthenticationFailure::MalformedToken {
                reason: "signature is not base64url".to_string(),
            }
        })?;
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(|err| {
            AuthenticationFailure::Backend {
                message: format!("invalid signing key: {err}"),
            }
        })?;
        mac.update(format!("{header_b64}.{body_b64}").as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthenticationFailure::InvalidSignature)?;

        let token_claims: TokenClaims = decode_json(body_b64)?;

        let now = chrono::Utc::now().timestamp();
        if token_claims.exp <= now {
            return Err(AuthenticationFailure::Expired);
        }

        if !self.audience.is_empty()
            && token_claims.aud.as_deref() != Some(self.audience.as_str())
        {
            return Err(AuthenticationFailure::WrongAudience);
        }

        self.check_issuer(token_claims.iss.as_deref())?;

        let mut principal = Principal::new(token_claims.sub, AuthScheme::Bearer);
        for role in token_claims.roles {
            principal = principal.with_claim(claims::ROLE, role);
        }
        for grant in token_claims.permissions {
            principal = principal.with_claim(claims::PERMISSION, grant);
        }
        Ok(principal)
    }

    fn check_issuer(&self, issuer: Option<&str>) -> Result<(), AuthenticationFailure> {
        match &self.issuer {
            IssuerValidation::Disabled => Ok(()),
            IssuerValidation::Standard { issuer: expected } => {
                if issuer == Some(expected.as_str()) {
                    Ok(())
                } else {
                    Err(AuthenticationFailure::WrongIssuer)
                }
            }
            IssuerValidation::MultitenantWildcard { template } => {
                let issuer = issuer.ok_or(AuthenticationFailure::WrongIssuer)?;
                if issuer_matches_template(template, issuer) {
                    Ok(())
                } else {
                    Err(AuthenticationFailure::WrongIssuer)
                }
            }
        }
    }
}

/// Whether an issuer matches a wildcard template.
///
/// The `{tenant}` placeholder stands for exactly one non-empty path
/// segment; the rest of the template is compared verbatim.
pub fn issuer_matches_template(template: &str, issuer: &str) -> bool {
    let Some((prefix, suffix)) = template.split_once(TENANT_PLACEHOLDER) else {
        return template == issuer;
    };
    let Some(rest) = issuer.strip_prefix(prefix) else {
        return false;
    };
    let Some(tenant) = rest.strip_suffix(suffix) else {
        return false;
    };
    !tenant.is_empty() && !tenant.contains('/')
}

fn split_compact(token: &str) -> Result<(&str, &str, &str), AuthenticationFailure> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(h), Some(b), Some(s), None) => Ok((h, b, s)),
        _ => Err(AuthenticationFailure::MalformedToken {
            reason: "expected three dot-separated segments".to_string(),
        }),
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(
    segment: &str,
) -> Result<T, AuthenticationFailure> {
    let bytes =
        URL_SAFE_NO_PAD
            .decode(segment)
            .map_err(|_| AuthenticationFailure::MalformedToken {
                reason: "segment is not base64url".to_string(),
            })?;
    serde_json::from_slice(&bytes).map_err(|err| AuthenticationFailure::MalformedToken {
        reason: format!("segment is not valid JSON: {err}"),
    })
}
