//! Identity Toolkit client against a mock server

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::Utc;
use larder_firebase::{FirebaseError, FirebaseOptions, IdentityClient};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> IdentityClient {
    IdentityClient::new(&FirebaseOptions::new("test-key", "demo")).with_base_urls(
        format!("{}/identity/v1", server.uri()),
        format!("{}/securetoken/v1", server.uri()),
    )
}

#[tokio::test]
async fn anonymous_sign_up_returns_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v1/accounts:signUp"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({ "returnSecureToken": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "identitytoolkit#SignupNewUserResponse",
            "idToken": "id-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600",
            "localId": "anon-user"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let before = Utc::now();
    let session = client(&server).sign_up_anonymous().await.unwrap();

    assert_eq!(session.local_id, "anon-user");
    assert_eq!(session.id_token, "id-1");
    assert_eq!(session.refresh_token, "refresh-1");
    assert!(session.expires_at >= before + chrono::Duration::seconds(3599));
}

#[tokio::test]
async fn custom_token_sign_in_looks_up_the_uid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v1/accounts:signInWithCustomToken"))
        .and(body_partial_json(json!({ "token": "minted", "returnSecureToken": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "idToken": "id-2",
            "refreshToken": "refresh-2",
            "expiresIn": "3600"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/identity/v1/accounts:lookup"))
        .and(body_partial_json(json!({ "idToken": "id-2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{ "localId": "custom-user" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client(&server)
        .sign_in_with_custom_token("minted")
        .await
        .unwrap();

    assert_eq!(session.local_id, "custom-user");
    assert_eq!(session.id_token, "id-2");
}

#[tokio::test]
async fn rejected_custom_token_surfaces_the_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v1/accounts:signInWithCustomToken"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "INVALID_CUSTOM_TOKEN", "errors": [] }
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .sign_in_with_custom_token("bogus")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        FirebaseError::ApiError {
            status: 400,
            message: "INVALID_CUSTOM_TOKEN".to_string()
        }
    );
}

#[tokio::test]
async fn refresh_uses_the_secure_token_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/securetoken/v1/token"))
        .and(query_param("key", "test-key"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "id-3",
            "expires_in": "3600",
            "token_type": "Bearer",
            "refresh_token": "refresh-3",
            "id_token": "id-3",
            "user_id": "anon-user",
            "project_id": "1234"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = client(&server).refresh("refresh-1").await.unwrap();

    assert_eq!(session.local_id, "anon-user");
    assert_eq!(session.id_token, "id-3");
    assert_eq!(session.refresh_token, "refresh-3");
}

#[tokio::test]
async fn status_codes_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client(&server).sign_up_anonymous().await.unwrap_err();
    assert_eq!(err, FirebaseError::RateLimited);
}

#[tokio::test]
async fn unreachable_host_is_a_request_failure() {
    let client = IdentityClient::new(&FirebaseOptions::new("k", "demo"))
        .with_base_urls("http://127.0.0.1:9/v1", "http://127.0.0.1:9/v1");

    let err = client.sign_up_anonymous().await.unwrap_err();
    assert!(matches!(err, FirebaseError::RequestFailed(_)));
}
