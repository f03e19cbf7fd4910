// src/services/auth.rs
//! Authentication service.
//!
//! The functions behind the user-facing auth actions: register, login,
//! wallet authentication and logout. Each successful action writes the
//! returned user (with its DID, credential, ZKP data and token) to the
//! session store.

use crate::error::{AuthError, GatewayError, WalletError};
use crate::models::did;
use crate::models::session::{AuthMethod, AuthResponse, UserPayload};
use crate::services::api_gateway::{ApiGateway, ApiResponse, WalletProof};
use crate::storage::session_store::SessionStore;
use crate::wallet::provider::WalletProvider;
use serde_json::Value;
use std::sync::Arc;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Auth actions over the gateway and the session store.
pub struct AuthService {
    gateway: Arc<ApiGateway>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        let session = gateway.session().clone();
        AuthService { gateway, session }
    }

    pub fn gateway(&self) -> &Arc<ApiGateway> {
        &self.gateway
    }

    /// Registers a new email/password user.
    ///
    /// # Errors
    /// - [`AuthError::InvalidInput`] for empty fields or a password shorter
    ///   than [`MIN_PASSWORD_LEN`]; nothing is sent in that case
    /// - [`AuthError::Gateway`] for transport or backend failures
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<UserPayload, AuthError> {
        require_field("name", name)?;
        require_field("email", email)?;
        require_field("password", password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::InvalidInput(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        log::info!("[Auth] registering user {}", email);
        let response = self
            .gateway
            .register(name.trim(), email.trim(), password)
            .await
            .map_err(|e| log_failure("register", e))?;

        let user = self.establish(accepted("register", &response)?, AuthMethod::EmailPassword);
        log::info!(
            "[Auth] registration succeeded, did={} credential={}",
            user.did.as_deref().map(|d| did::format_short(d, did::DEFAULT_TAIL_CHARS)).unwrap_or_default(),
            user.credential.is_some()
        );
        Ok(user)
    }

    /// Logs in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserPayload, AuthError> {
        require_field("email", email)?;
        require_field("password", password)?;

        log::info!("[Auth] logging in {}", email);
        let response = self
            .gateway
            .login(email.trim(), password)
            .await
            .map_err(|e| log_failure("login", e))?;

        let user = self.establish(accepted("login", &response)?, AuthMethod::EmailPassword);
        log::info!("[Auth] login succeeded, has_did={}", user.did.is_some());
        Ok(user)
    }

    /// Full wallet flow: connect, sign a login message, authenticate.
    ///
    /// Aborts before any backend call if no wallet is available, the wallet
    /// returns no account or the user rejects either request; the session is
    /// left untouched.
    pub async fn authenticate_with_wallet(
        &self,
        wallet: Option<&dyn WalletProvider>,
    ) -> Result<UserPayload, AuthError> {
        let wallet = wallet.ok_or_else(|| {
            log::warn!("[Wallet] no wallet provider available");
            WalletError::NotAvailable
        })?;
        let address = connect_wallet(wallet).await?;

        let message = login_message(&address, self.session.clock().now_millis());
        log::info!("[Wallet] requesting signature from {}", address);
        let signature = wallet
            .personal_sign(&message, &address)
            .await
            .map_err(|e| log_wallet_failure("signature", e))?;

        self.wallet_auth(&address, Some(WalletProof { message, signature })).await
    }

    /// Authenticates a wallet address with the backend, optionally with a signed proof.
    pub async fn wallet_auth(&self, address: &str, proof: Option<WalletProof>) -> Result<UserPayload, AuthError> {
        require_field("walletAddress", address)?;

        let response = self
            .gateway
            .wallet_auth(address, proof.as_ref())
            .await
            .map_err(|e| log_failure("wallet-auth", e))?;

        let mut user = self.establish_unsaved(accepted("wallet-auth", &response)?, AuthMethod::Wallet);
        if user.wallet_address.is_none() {
            user.wallet_address = Some(address.to_string());
        }
        self.persist(&user);
        log::info!("[Wallet] authenticated {}", address);
        Ok(user)
    }

    /// Logs out: notifies the backend best-effort, then always clears the session.
    pub async fn logout(&self) {
        log::info!("[Auth] logging out");
        if self.session.has_active_session() {
            if let Err(e) = self.gateway.logout().await {
                log::warn!("[Auth] backend logout failed: {}", e);
            }
        }
        self.session.clear_session();
    }

    pub fn current_user(&self) -> Option<UserPayload> {
        self.session.get_session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.has_active_session()
    }

    fn establish(&self, response: AuthResponse, auth_type: AuthMethod) -> UserPayload {
        let user = self.establish_unsaved(response, auth_type);
        self.persist(&user);
        user
    }

    fn establish_unsaved(&self, response: AuthResponse, auth_type: AuthMethod) -> UserPayload {
        let user = response.into_user_payload(auth_type);
        if let Some(value) = user.did.as_deref() {
            if !did::is_valid(value) {
                log::warn!("[Auth] backend returned a malformed DID");
            }
        }
        user
    }

    fn persist(&self, user: &UserPayload) {
        if !self.session.save_session(user) {
            log::warn!("[Auth] session could not be persisted; user will need to log in again");
        }
    }
}

/// Requests wallet access and returns the first account.
pub async fn connect_wallet(wallet: &dyn WalletProvider) -> Result<String, WalletError> {
    log::info!("[Wallet] requesting accounts");
    let accounts = wallet
        .request_accounts()
        .await
        .map_err(|e| log_wallet_failure("connection", e))?;
    let address = accounts.into_iter().next().ok_or(WalletError::NoAccounts)?;
    log::info!("[Wallet] connected {}", address);
    Ok(address)
}

/// Message the user signs to prove wallet ownership.
pub fn login_message(address: &str, now_ms: i64) -> String {
    format!(
        "Sign in to the ZKP identity service\n\nWallet: {}\nIssued at: {}",
        address, now_ms
    )
}

fn require_field(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn log_wallet_failure(action: &str, error: WalletError) -> WalletError {
    if error.is_user_rejection() {
        log::info!("[Wallet] {} rejected by user", action);
    } else {
        log::warn!("[Wallet] {} failed: {}", action, error);
    }
    error
}

/// Body of a 2xx auth answer, unless it reports `success: false`.
fn accepted(action: &str, response: &ApiResponse) -> Result<AuthResponse, AuthError> {
    if response.data.get("success") == Some(&Value::Bool(false)) {
        let message = ["error", "message"]
            .iter()
            .find_map(|key| response.data.get(*key).and_then(Value::as_str))
            .unwrap_or("request was not accepted")
            .to_string();
        log::error!("[Auth] {} refused: {}", action, message);
        return Err(AuthError::Rejected {
            message,
            data: response.data.clone(),
        });
    }
    Ok(response.json()?)
}

fn log_failure(action: &str, error: GatewayError) -> AuthError {
    log::error!(
        "[Auth] {} failed: {}",
        action,
        error.backend_message().unwrap_or(&error.to_string())
    );
    AuthError::Gateway(error)
}
