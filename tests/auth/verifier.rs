use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use vendo::auth::{AuthErrorKind, HttpTokenVerifier, TokenVerifier};

fn verifier(url: String) -> HttpTokenVerifier {
    HttpTokenVerifier::new(url, Duration::from_secs(2))
}

#[tokio::test]
async fn given_valid_token_when_verifying_then_claims_are_parsed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/userinfo")
                .header("Authorization", "Bearer tok-123");
            then.status(200).json_body(json!({
                "preferred_username": "mom",
                "groups": ["drink", "members"]
            }));
        })
        .await;

    let claims = verifier(format!("{}/userinfo", server.base_url()))
        .verify("tok-123")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(claims.username, "mom");
    assert!(claims.in_group("drink"));
    assert!(!claims.in_group("admins"));
}

#[tokio::test]
async fn given_provider_rejection_when_verifying_then_credential_is_invalid() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/userinfo");
            then.status(401).body("token expired");
        })
        .await;

    let err = verifier(format!("{}/userinfo", server.base_url()))
        .verify("stale")
        .await
        .unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::InvalidCredential);
}

#[tokio::test]
async fn given_missing_groups_claim_when_verifying_then_groups_default_to_empty() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/userinfo");
            then.status(200)
                .json_body(json!({ "preferred_username": "mom" }));
        })
        .await;

    let claims = verifier(format!("{}/userinfo", server.base_url()))
        .verify("tok")
        .await
        .unwrap();
    assert!(claims.groups.is_empty());
}

#[tokio::test]
async fn given_unreachable_provider_when_verifying_then_provider_is_unavailable() {
    let err = verifier("http://127.0.0.1:1/userinfo".to_string())
        .verify("tok")
        .await
        .unwrap_err();
    assert_eq!(err.kind, AuthErrorKind::ProviderUnavailable);
}
