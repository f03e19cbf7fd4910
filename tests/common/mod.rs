// tests/common/mod.rs
//! Shared fixtures for integration tests: an in-memory client wired to a
//! mockito backend, and canned backend bodies.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use zkp_identity_client::services::api_gateway::{ApiGateway, Navigator};
use zkp_identity_client::storage::kv_store::MemoryStore;
use zkp_identity_client::utils::clock::ManualClock;
use zkp_identity_client::SessionStore;

pub const T0: i64 = 1_700_000_000_000;
pub const HOLDER_DID: &str = "did:example:polygon:amoy:abc123";
pub const ISSUER_DID: &str = "did:polygonid:polygon:amoy:2qIssuerNode";

/// Navigator that counts redirects.
#[derive(Default)]
pub struct RecordingNavigator {
    redirects: AtomicUsize,
}

impl RecordingNavigator {
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to_entry(&self) {
        self.redirects.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct TestClient {
    pub gateway: Arc<ApiGateway>,
    pub session: Arc<SessionStore>,
    pub backend: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
    pub navigator: Arc<RecordingNavigator>,
}

pub fn client(base_url: &str) -> TestClient {
    client_with_timeout(base_url, Duration::from_secs(5))
}

pub fn client_with_timeout(base_url: &str, timeout: Duration) -> TestClient {
    let backend = Arc::new(MemoryStore::new());
    let clock = Arc::new(ManualClock::new(T0));
    let session = Arc::new(SessionStore::with_clock(backend.clone(), clock.clone()));
    let navigator = Arc::new(RecordingNavigator::default());
    let gateway = ApiGateway::new(base_url, timeout, session.clone())
        .expect("gateway")
        .with_navigator(navigator.clone());

    TestClient {
        gateway: Arc::new(gateway),
        session,
        backend,
        clock,
        navigator,
    }
}

pub fn credential_json(issuer: Option<&str>) -> Value {
    let mut credential = json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "id": "urn:uuid:5f1c7a4e",
        "type": ["VerifiableCredential", "ZKPAuthCredential"],
        "issuanceDate": "2024-05-01T10:00:00Z",
        "credentialSubject": {
            "id": HOLDER_DID,
            "authMethod": "email",
            "accountState": "active",
            "isVerified": true
        }
    });
    if let Some(issuer) = issuer {
        credential["issuer"] = json!(issuer);
    }
    credential
}

/// Body of a successful login, register or wallet-auth call.
pub fn auth_body(credential: Value) -> Value {
    json!({
        "success": true,
        "did": HOLDER_DID,
        "user": {"name": "Ana", "email": "ana@example.com"},
        "zkpData": {"identifier": ISSUER_DID, "state": "0x01"},
        "credential": credential,
        "token": "token-1"
    })
}

pub fn issuer_node_result() -> Value {
    json!({
        "success": true,
        "verified": true,
        "message": "Credential verified by issuer node",
        "proof": {
            "method": "issuer-node",
            "credentialId": "urn:uuid:5f1c7a4e",
            "subject": HOLDER_DID,
            "notRevoked": true,
            "timestamp": "2024-05-01T10:00:05Z",
            "cryptographicProof": {
                "signature": "0xfeed",
                "coreClaim": "claim",
                "issuerMtp": {"existence": true, "siblingsCount": 3}
            }
        },
        "fullData": {"issuerState": "0x02"}
    })
}
