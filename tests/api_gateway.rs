// tests/api_gateway.rs
//! Request and response interception of the API gateway against a mock backend.

mod common;

use common::*;
use mockito::Matcher;
use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;
use zkp_identity_client::models::session::UserPayload;
use zkp_identity_client::services::api_gateway::endpoints;
use zkp_identity_client::storage::session_store::SESSION_SLOT;
use zkp_identity_client::storage::kv_store::KeyValueStore;
use zkp_identity_client::GatewayError;

fn logged_in_user() -> UserPayload {
    UserPayload {
        name: Some("Ana".into()),
        did: Some(HOLDER_DID.into()),
        token: Some("token-1".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_bearer_token_attached_and_session_renewed() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", endpoints::USER_PROFILE)
        .match_header("authorization", "Bearer token-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"name": "Ana"}).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    client.session.save_session(&logged_in_user());
    client.clock.advance(60 * 60 * 1000);

    let response = client.gateway.get_user_profile().await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.data, json!({"name": "Ana"}));
    mock.assert_async().await;

    let renewed = client.session.read_session().unwrap();
    assert_eq!(renewed.timestamp, T0 + 60 * 60 * 1000);
    assert_eq!(renewed.user, logged_in_user());
}

#[tokio::test]
async fn test_no_authorization_without_session() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::LOGIN)
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({"email": "ana@example.com", "password": "secret1"})))
        .with_status(200)
        .with_body(auth_body(credential_json(None)).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    client.gateway.login("ana@example.com", "secret1").await.unwrap();
    mock.assert_async().await;
    // The gateway never writes the session itself.
    assert!(client.backend.is_empty());
}

#[tokio::test]
async fn test_unauthorized_clears_session_and_navigates() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", endpoints::USER_PROFILE)
        .with_status(401)
        .with_body(json!({"error": "token expired"}).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    client.session.save_session(&logged_in_user());

    let err = client.gateway.get_user_profile().await.unwrap_err();
    assert!(matches!(err, GatewayError::Unauthorized { .. }), "{err:?}");
    assert_eq!(err.status(), Some(401));
    assert_eq!(client.backend.get(SESSION_SLOT).unwrap(), None);
    assert!(!client.session.has_active_session());
    assert_eq!(client.navigator.redirects(), 1);
}

#[tokio::test]
async fn test_backend_rejection_has_no_side_effects() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", endpoints::REGISTER)
        .with_status(400)
        .with_body(json!({"error": "Email already registered"}).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    client.session.save_session(&logged_in_user());

    let err = client.gateway.register("Ana", "ana@example.com", "secret1").await.unwrap_err();
    match &err {
        GatewayError::BackendRejection { status, url, .. } => {
            assert_eq!(*status, 400);
            assert!(url.ends_with(endpoints::REGISTER));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.backend_message(), Some("Email already registered"));
    assert!(client.session.has_active_session());
    assert_eq!(client.navigator.redirects(), 0);
}

#[tokio::test]
async fn test_wallet_auth_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::WALLET_AUTH)
        .match_body(Matcher::Json(json!({
            "walletAddress": "0x1234567890abcdef1234567890abcdef1234abcd",
            "name": "Wallet 0x1234...abcd"
        })))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = client(&server.url());
    client
        .gateway
        .wallet_auth("0x1234567890abcdef1234567890abcdef1234abcd", None)
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_failure() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client(&format!("http://127.0.0.1:{}", port));

    let err = client.gateway.verify_session().await.unwrap_err();
    match err {
        GatewayError::Transport { timed_out, .. } => assert!(!timed_out),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    // Accepted by the kernel backlog but never answered.
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let client = client_with_timeout(&url, Duration::from_millis(300));

    let err = client.gateway.get_user_profile().await.unwrap_err();
    match err {
        GatewayError::Transport { timed_out, .. } => assert!(timed_out),
        other => panic!("unexpected error {other:?}"),
    }
    drop(listener);
}

#[tokio::test]
async fn test_verify_proof_body() {
    use zkp_identity_client::models::proof_request::{ProofRequest, ProofType, ATOMIC_QUERY_CIRCUIT};

    let request = ProofRequest::new(&ProofType::IsVerified, ISSUER_DID, T0 / 1000);
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::VERIFY_PROOF)
        .match_body(Matcher::PartialJson(json!({
            "proof": {"pi_a": ["1", "2"]},
            "circuitId": ATOMIC_QUERY_CIRCUIT,
            "query": {"allowedIssuers": [ISSUER_DID], "type": "ZKPAuthCredential"}
        })))
        .with_status(200)
        .with_body(json!({"verified": true}).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    let response = client
        .gateway
        .verify_proof(&json!({"pi_a": ["1", "2"]}), &request)
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(response.data["verified"], json!(true));
}
