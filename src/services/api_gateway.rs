// src/services/api_gateway.rs
//! API Gateway for the identity backend.
//!
//! Every backend call goes through [`ApiGateway`], so the same rules apply
//! to all of them:
//!
//! - **Request phase**: when a session is active, its bearer token (if any)
//!   is attached as `Authorization` and the session is renewed.
//! - **Response phase**: a 401 clears the session and sends the host back to
//!   the unauthenticated entry point through the injected [`Navigator`].
//!   Any other non-2xx status becomes [`GatewayError::BackendRejection`]
//!   with no side effects.
//!
//! The gateway talks to the backend, never to the issuer node directly;
//! the backend proxies issuer-node operations.

use crate::config::ClientConfig;
use crate::error::GatewayError;
use crate::models::credential::VerifiableCredential;
use crate::models::proof_request::ProofRequest;
use crate::storage::session_store::SessionStore;
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Backend paths, relative to the base URL.
pub mod endpoints {
    pub const REGISTER: &str = "/api/register";
    pub const LOGIN: &str = "/api/login";
    pub const WALLET_AUTH: &str = "/api/wallet-auth";
    pub const LOGOUT: &str = "/api/logout";
    pub const VERIFY_SESSION: &str = "/api/verify-session";
    pub const VERIFY_CREDENTIAL: &str = "/api/verify-credential";
    pub const VERIFY_PROOF: &str = "/api/proofs/verify";
    pub const USER_PROFILE: &str = "/api/user/profile";
}

/// Unauthenticated entry point the host returns to after a 401.
pub const ENTRY_POINT: &str = "/";

/// Host hook for the forced logout that follows a 401.
pub trait Navigator: Send + Sync {
    /// Hard navigation back to the unauthenticated entry point.
    fn navigate_to_entry(&self);
}

/// Navigator for headless hosts: only records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate_to_entry(&self) {
        log::warn!("[API] session rejected by backend, returning to {}", ENTRY_POINT);
    }
}

/// Successful (2xx) backend answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
    pub url: String,
}

impl ApiResponse {
    /// Deserializes the body into `T`.
    ///
    /// # Errors
    /// [`GatewayError::InvalidResponse`] when the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        serde_json::from_value(self.data.clone()).map_err(|e| GatewayError::InvalidResponse {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }
}

/// Signed ownership proof sent with wallet authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WalletProof {
    pub message: String,
    pub signature: String,
}

/// Display name the backend assigns to wallet accounts: `Wallet 0x1234...abcd`.
pub fn wallet_display_name(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return format!("Wallet {}", address);
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("Wallet {}...{}", head, tail)
}

/// Single HTTP client for all backend operations.
pub struct ApiGateway {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiGateway {
    /// Creates a gateway bound to `base_url` with a fixed request timeout.
    ///
    /// # Errors
    /// [`GatewayError::Setup`] if the URL is malformed or the HTTP client
    /// cannot be built.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> Result<Self, GatewayError> {
        Url::parse(base_url)
            .map_err(|e| GatewayError::Setup(format!("invalid backend URL {:?}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Setup(e.to_string()))?;

        Ok(ApiGateway {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            navigator: Arc::new(LogNavigator),
        })
    }

    pub fn from_config(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self, GatewayError> {
        Self::new(&config.backend_url, config.request_timeout(), session)
    }

    /// Replaces the navigator invoked after a 401.
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, GatewayError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|e| GatewayError::Setup(format!("invalid URL {:?}: {}", raw, e)))
    }

    /// Dispatches one request through both interception phases.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse, GatewayError> {
        let url = self.url_for(path)?;
        let url_text = url.to_string();
        log::debug!("[API Request] {} {}", method, url_text);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        // Request phase.
        if let Some(user) = self.session.get_session() {
            if let Some(token) = user.token.as_deref() {
                request = request.bearer_auth(token);
            }
            self.session.renew_session();
        }

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                log::error!("[API Setup Error] {}: {}", url_text, e);
                GatewayError::Setup(e.to_string())
            } else {
                log::error!("[API No Response] {}: {}", url_text, e);
                GatewayError::Transport {
                    url: url_text.clone(),
                    message: e.to_string(),
                    timed_out: e.is_timeout(),
                }
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            log::error!("[API No Response] {}: body unreadable: {}", url_text, e);
            GatewayError::Transport {
                url: url_text.clone(),
                message: e.to_string(),
                timed_out: e.is_timeout(),
            }
        })?;
        let data = parse_body(text);

        // Response phase.
        if status.is_success() {
            log::debug!("[API Response] {} {}", status.as_u16(), url_text);
            return Ok(ApiResponse {
                status: status.as_u16(),
                data,
                url: url_text,
            });
        }

        log::error!(
            "[API Response Error] status={} url={} data={}",
            status.as_u16(),
            url_text,
            data
        );

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.session.clear_session();
            self.navigator.navigate_to_entry();
            return Err(GatewayError::Unauthorized { url: url_text, data });
        }

        Err(GatewayError::BackendRejection {
            status: status.as_u16(),
            data,
            url: url_text,
        })
    }

    pub async fn post(&self, path: &str, body: Option<&Value>) -> Result<ApiResponse, GatewayError> {
        self.send(Method::POST, path, body).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, GatewayError> {
        self.send(Method::GET, path, None).await
    }

    // =====================
    // Backend operations
    // =====================

    /// `POST /api/register`
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<ApiResponse, GatewayError> {
        let body = json!({ "name": name, "email": email, "password": password });
        self.post(endpoints::REGISTER, Some(&body)).await
    }

    /// `POST /api/login`
    pub async fn login(&self, email: &str, password: &str) -> Result<ApiResponse, GatewayError> {
        let body = json!({ "email": email, "password": password });
        self.post(endpoints::LOGIN, Some(&body)).await
    }

    /// `POST /api/wallet-auth`
    ///
    /// Creates or recovers the DID bound to `address`. The signature is
    /// optional on the wire; the backend decides whether to require it.
    pub async fn wallet_auth(&self, address: &str, proof: Option<&WalletProof>) -> Result<ApiResponse, GatewayError> {
        let mut body = json!({
            "walletAddress": address,
            "name": wallet_display_name(address),
        });
        if let Some(proof) = proof {
            body["signature"] = json!(proof.signature);
            body["message"] = json!(proof.message);
        }
        self.post(endpoints::WALLET_AUTH, Some(&body)).await
    }

    /// `POST /api/logout`
    pub async fn logout(&self) -> Result<ApiResponse, GatewayError> {
        self.post(endpoints::LOGOUT, None).await
    }

    /// `POST /api/verify-credential` with `{credential, issuerDID}`.
    pub async fn verify_credential(
        &self,
        credential: &VerifiableCredential,
        issuer_did: &str,
    ) -> Result<ApiResponse, GatewayError> {
        let body = json!({ "credential": credential, "issuerDID": issuer_did });
        self.post(endpoints::VERIFY_CREDENTIAL, Some(&body)).await
    }

    /// `GET /api/user/profile`
    pub async fn get_user_profile(&self) -> Result<ApiResponse, GatewayError> {
        self.get(endpoints::USER_PROFILE).await
    }

    /// `POST /api/verify-session`: asks the backend whether the bearer token is still accepted.
    pub async fn verify_session(&self) -> Result<ApiResponse, GatewayError> {
        self.post(endpoints::VERIFY_SESSION, None).await
    }

    /// `POST /api/proofs/verify` with `{proof, circuitId, query}`.
    pub async fn verify_proof(&self, proof: &Value, request: &ProofRequest) -> Result<ApiResponse, GatewayError> {
        let body = json!({
            "proof": proof,
            "circuitId": request.circuit_id,
            "query": request.query,
        });
        self.post(endpoints::VERIFY_PROOF, Some(&body)).await
    }
}

fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
