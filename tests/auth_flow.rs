// tests/auth_flow.rs
//! Login, wallet authentication and logout end to end against a mock backend.

mod common;

use common::*;
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use zkp_identity_client::models::did;
use zkp_identity_client::models::session::AuthMethod;
use zkp_identity_client::services::api_gateway::endpoints;
use zkp_identity_client::wallet::key_management::{ApprovalPolicy, LocalWallet};
use zkp_identity_client::{AuthError, AuthService, CredentialVerifier, WalletError};

#[tokio::test]
async fn test_login_establishes_session() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", endpoints::LOGIN)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(auth_body(credential_json(Some(ISSUER_DID))).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    let auth = AuthService::new(client.gateway.clone());
    let user = auth.login("ana@example.com", "secret1").await.unwrap();

    assert_eq!(user.did.as_deref(), Some(HOLDER_DID));
    assert_eq!(user.auth_type, Some(AuthMethod::EmailPassword));
    assert_eq!(did::format_short(HOLDER_DID, did::DEFAULT_TAIL_CHARS), "did:...y:abc123");

    let stored = client.session.get_session().unwrap();
    assert_eq!(stored, user);
    assert_eq!(stored.token.as_deref(), Some("token-1"));
    assert!(stored.credential.unwrap().is_complete());
}

#[tokio::test]
async fn test_register_rejected_by_backend() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", endpoints::REGISTER)
        .with_status(409)
        .with_body(json!({"error": "Email already registered"}).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    let auth = AuthService::new(client.gateway.clone());
    let err = auth.register("Ana", "ana@example.com", "secret1").await.unwrap_err();

    assert_eq!(err.user_message(), "Email already registered");
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_wallet_login_signs_and_saves_wallet_session() {
    let wallet = LocalWallet::new();
    let address = wallet.address().to_string();

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::WALLET_AUTH)
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "walletAddress": address })),
            Matcher::Regex("\"signature\":\"0x[0-9a-f]{130}\"".into()),
        ]))
        .with_status(200)
        .with_body(json!({"did": HOLDER_DID, "token": "wallet-token"}).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    let auth = AuthService::new(client.gateway.clone());
    let user = auth.authenticate_with_wallet(Some(&wallet)).await.unwrap();
    mock.assert_async().await;

    assert_eq!(user.auth_type, Some(AuthMethod::Wallet));
    assert_eq!(user.wallet_address.as_deref(), Some(address.as_str()));
    assert_eq!(client.session.get_session(), Some(user));
}

#[tokio::test]
async fn test_rejected_signature_aborts_before_backend() {
    let wallet = LocalWallet::new();
    wallet.set_policy(ApprovalPolicy::RejectSignatures);

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::WALLET_AUTH)
        .expect(0)
        .create_async()
        .await;

    let client = client(&server.url());
    let auth = AuthService::new(client.gateway.clone());
    let err = auth.authenticate_with_wallet(Some(&wallet)).await.unwrap_err();

    assert!(matches!(err, AuthError::Wallet(WalletError::SignatureRejected)), "{err:?}");
    mock.assert_async().await;
    assert!(client.backend.is_empty());
}

#[tokio::test]
async fn test_rejected_connection_aborts_before_backend() {
    let wallet = LocalWallet::new();
    wallet.set_policy(ApprovalPolicy::RejectConnection);

    let server = mockito::Server::new_async().await;
    let client = client(&server.url());
    let auth = AuthService::new(client.gateway.clone());

    let err = auth.authenticate_with_wallet(Some(&wallet)).await.unwrap_err();
    assert!(matches!(err, AuthError::Wallet(WalletError::ConnectionRejected)), "{err:?}");
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_logout_clears_session_even_when_backend_fails() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::LOGOUT)
        .match_header("authorization", "Bearer token-1")
        .with_status(500)
        .create_async()
        .await;

    let client = client(&server.url());
    client.session.save_session(&zkp_identity_client::models::session::UserPayload {
        token: Some("token-1".into()),
        ..Default::default()
    });

    let auth = AuthService::new(client.gateway.clone());
    auth.logout().await;
    mock.assert_async().await;
    assert!(!auth.is_authenticated());
    assert!(client.backend.is_empty());
}

#[tokio::test]
async fn test_wallet_disconnect_ends_session() {
    let server = mockito::Server::new_async().await;
    let client = client(&server.url());
    let wallet = LocalWallet::new();

    client.session.save_session(&zkp_identity_client::models::session::UserPayload {
        wallet_address: Some(wallet.address().to_string()),
        ..Default::default()
    });

    let session = Arc::clone(&client.session);
    let watcher = zkp_identity_client::wallet::watcher::spawn_session_watcher(&wallet, session);
    wallet.disconnect();
    drop(wallet);

    watcher.await.unwrap();
    assert!(!client.session.has_active_session());
}

#[tokio::test]
async fn test_success_false_login_creates_no_session() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", endpoints::LOGIN)
        .with_status(200)
        .with_body(json!({"success": false, "error": "Invalid credentials"}).to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    let auth = AuthService::new(client.gateway.clone());
    let err = auth.login("ana@example.com", "wrong-pass").await.unwrap_err();

    match &err {
        AuthError::Rejected { data, .. } => assert_eq!(data["error"], json!("Invalid credentials")),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.user_message(), "Invalid credentials");
    assert!(!auth.is_authenticated());
    assert!(client.backend.is_empty());
}

#[tokio::test]
async fn test_wallet_login_without_provider() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::WALLET_AUTH)
        .expect(0)
        .create_async()
        .await;

    let client = client(&server.url());
    let auth = AuthService::new(client.gateway.clone());
    let err = auth.authenticate_with_wallet(None).await.unwrap_err();

    assert!(matches!(err, AuthError::Wallet(WalletError::NotAvailable)), "{err:?}");
    mock.assert_async().await;
    assert!(client.backend.is_empty());
}

#[tokio::test]
async fn test_login_with_single_valued_credential_fields() {
    let mut credential = credential_json(None);
    credential["@context"] = json!("https://www.w3.org/2018/credentials/v1");
    credential["type"] = json!("VerifiableCredential");
    credential["issuer"] = json!({"id": ISSUER_DID, "name": "Issuer Node"});

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", endpoints::LOGIN)
        .with_status(200)
        .with_body(auth_body(credential.clone()).to_string())
        .create_async()
        .await;
    let verify = server
        .mock("POST", endpoints::VERIFY_CREDENTIAL)
        .match_body(Matcher::PartialJson(json!({
            "issuerDID": ISSUER_DID,
            "credential": {
                "@context": "https://www.w3.org/2018/credentials/v1",
                "type": "VerifiableCredential",
                "issuer": {"id": ISSUER_DID, "name": "Issuer Node"}
            }
        })))
        .with_status(200)
        .with_body(issuer_node_result().to_string())
        .create_async()
        .await;

    let client = client(&server.url());
    let auth = AuthService::new(client.gateway.clone());
    let user = auth.login("ana@example.com", "secret1").await.unwrap();

    let stored = client.session.get_session().unwrap();
    let stored_credential = stored.credential.as_ref().unwrap();
    assert_eq!(serde_json::to_value(stored_credential).unwrap(), credential);
    assert_eq!(stored_credential.issuer_id(), Some(ISSUER_DID));
    assert!(stored_credential.has_type("VerifiableCredential"));

    let result = CredentialVerifier::new(client.gateway.clone())
        .verify_user(&user, None)
        .await
        .unwrap();
    verify.assert_async().await;
    assert!(result.verified);
}
