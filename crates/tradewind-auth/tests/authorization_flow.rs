//! End-to-end authorization flow: credentials -> principal -> policy ->
//! decision, over a registry populated by a simulated feature module.

use std::sync::Arc;

use tradewind_auth::{
    encode_token, AuthScheme, BearerTokenValidator, Decision, DenyReason, InMemoryApiKeyResolver,
    InMemoryRoleStore, MultiSchemeAuthenticator, PermissionAuthorizationHandler, PermissionGrant,
    PermissionPolicyProvider, Principal, RequestCredentials, TokenClaims,
};
use tradewind_core::{AuthOptions, IssuerValidation, Permission, PermissionRegistryBuilder,
    PermissionScope, PlatformError};

const KEY: &[u8] = b"tradewind-integration-key";

fn auth_options() -> AuthOptions {
    AuthOptions {
        audience: "tradewind".into(),
        signing_key_hex: hex::encode(KEY),
        issuer: IssuerValidation::Standard {
            issuer: "https://auth.example.com".into(),
        },
        ..AuthOptions::default()
    }
}

fn registry() -> PermissionRegistryBuilder {
    // Module "orders" contributes its vocabulary at boot.
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
}

fn token_for(principal_grants: Vec<PermissionGrant>) -> String {
    let now = chrono::Utc::now().timestamp();
    let permissions = principal_grants
        .into_iter()
        .map(|g| g.encode().unwrap())
        .collect();
    encode_token(
        KEY,
        &TokenClaims {
            sub: "p".into(),
            iss: Some("https://auth.example.com".into()),
            aud: Some("tradewind".into()),
            iat: now,
            exp: now + 600,
            permissions,
            ..TokenClaims::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn scoped_permission_scenario() {
    let provider = PermissionPolicyProvider::new(Arc::new(registry().build()));
    let authenticator = MultiSchemeAuthenticator::new(
        BearerTokenValidator::from_options(&auth_options()).unwrap(),
        Arc::new(InMemoryApiKeyResolver::new()),
    );
    let handler = PermissionAuthorizationHandler::new(
        Arc::new(InMemoryRoleStore::new()),
        vec!["customer".to_string()],
    );

    // Principal P holds orders:cancel scoped to Store "west".
    let token = token_for(vec![PermissionGrant::scoped(
        "orders:cancel",
        vec![PermissionScope::store("west")],
    )]);
    let principal = authenticator
        .authenticate(&RequestCredentials::bearer(token))
        .await
        .unwrap();
    assert_eq!(principal.scheme(), AuthScheme::Bearer);

    let policy = provider.get_policy("orders:cancel").unwrap();
    assert!(policy.schemes.contains(&AuthScheme::Bearer));

    let west = handler
        .evaluate(
            &principal,
            &policy.permission,
            Some(&PermissionScope::store("west")),
        )
        .await
        .unwrap();
    assert_eq!(west, Decision::Allow);

    let east = handler
        .evaluate(
            &principal,
            &policy.permission,
            Some(&PermissionScope::store("east")),
        )
        .await
        .unwrap();
    assert_eq!(east, Decision::Deny(DenyReason::MissingPermission));

    let view_policy = provider.get_policy("orders:view").unwrap();
    let view = handler
        .evaluate(&principal, &view_policy.permission, None)
        .await
        .unwrap();
    assert_eq!(view, Decision::Deny(DenyReason::MissingPermission));
}

#[tokio::test]
async fn unknown_policy_name_is_a_configuration_error() {
    let provider = PermissionPolicyProvider::new(Arc::new(registry().build()));
    let err = provider.get_policy("orders:refund").unwrap_err();
    assert!(matches!(err, PlatformError::UnknownPolicy { .. }));
}

#[tokio::test]
async fn restricted_customer_cannot_use_any_gated_api() {
    let handler = PermissionAuthorizationHandler::new(
        Arc::new(
            InMemoryRoleStore::new()
                .with_role("customer", vec![PermissionGrant::unscoped("orders:view")]),
        ),
        vec!["customer".to_string()],
    );

    // Even with a direct grant and a role-derived grant, the override wins.
    let principal = Principal::new("shopper", AuthScheme::Bearer)
        .with_role("customer")
        .with_permission("orders:view");
    let decision = handler
        .evaluate(&principal, "orders:view", None)
        .await
        .unwrap();
    assert_eq!(decision, Decision::Deny(DenyReason::RestrictedRole));
}
