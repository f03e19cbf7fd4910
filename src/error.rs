// src/error.rs
//! Error taxonomy of the identity client.
//!
//! Failures are closed enums with typed payloads. Backend error bodies are
//! converted once, at the gateway boundary, into [`GatewayError`]; everything
//! downstream matches on variants instead of probing ad hoc JSON fields.
//!
//! A negative verification verdict is not an error: it arrives as a
//! [`VerificationResult`](crate::models::verification::VerificationResult)
//! with `verified = false`.

use crate::models::verification::VerificationStage;
use serde_json::Value;
use thiserror::Error;

/// EIP-1193 code for a request the user rejected in the wallet.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Failures of a call made through the API gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No response was received (connection refused, DNS, timeout).
    #[error("no response from {url}: {message}")]
    Transport {
        url: String,
        message: String,
        timed_out: bool,
    },

    /// The backend answered with a non-2xx status other than 401.
    #[error("backend rejected {url} with status {status}")]
    BackendRejection { status: u16, data: Value, url: String },

    /// The backend answered 401. The session has already been cleared.
    #[error("unauthorized request to {url}; session cleared")]
    Unauthorized { url: String, data: Value },

    /// The request could not be built, so nothing was sent.
    #[error("request setup failed: {0}")]
    Setup(String),

    /// A 2xx answer whose body does not have the expected shape.
    #[error("unexpected response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

impl GatewayError {
    /// HTTP status, when a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::BackendRejection { status, .. } => Some(*status),
            GatewayError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }

    /// Backend body, when a response was received.
    pub fn data(&self) -> Option<&Value> {
        match self {
            GatewayError::BackendRejection { data, .. } | GatewayError::Unauthorized { data, .. } => {
                Some(data)
            }
            _ => None,
        }
    }

    /// `error` (or else `message`) field of the backend body.
    pub fn backend_message(&self) -> Option<&str> {
        let data = self.data()?;
        data.get("error")
            .and_then(Value::as_str)
            .or_else(|| data.get("message").and_then(Value::as_str))
    }

    /// Verification `stage` carried by a rejection body.
    pub fn stage(&self) -> Option<VerificationStage> {
        self.data()?
            .get("stage")
            .and_then(Value::as_str)
            .map(|s| VerificationStage::from(s.to_string()))
    }

    /// `true` for failures where no response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, GatewayError::Transport { .. })
    }
}

/// Local precondition failures of the verification orchestrator.
///
/// All of these are raised before any network call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("no credential available to verify")]
    NoCredential,

    /// The credential lacks `credentialSubject`: the issuing step was defective.
    #[error("credential is incomplete: missing credentialSubject")]
    IncompleteCredential,

    #[error("no issuer DID could be resolved for the credential")]
    NoIssuer,
}

/// Failures reported by a wallet provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet provider is available")]
    NotAvailable,

    #[error("the wallet returned no accounts")]
    NoAccounts,

    #[error("user rejected the wallet connection")]
    ConnectionRejected,

    #[error("user rejected the signature request")]
    SignatureRejected,

    #[error("wallet provider error {code}: {message}")]
    Provider { code: i64, message: String },
}

impl WalletError {
    /// Maps an EIP-1193 error from a connection request.
    pub fn from_connect_code(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            WalletError::ConnectionRejected
        } else {
            WalletError::Provider {
                code,
                message: message.into(),
            }
        }
    }

    /// Maps an EIP-1193 error from a signature request.
    pub fn from_sign_code(code: i64, message: impl Into<String>) -> Self {
        if code == USER_REJECTED_CODE {
            WalletError::SignatureRejected
        } else {
            WalletError::Provider {
                code,
                message: message.into(),
            }
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, WalletError::ConnectionRejected | WalletError::SignatureRejected)
    }
}

/// Failures of the user-facing auth actions.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Rejected locally before any network call.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// 2xx answer whose body reports `success: false`. No session is created.
    #[error("backend refused the request: {message}")]
    Rejected { message: String, data: Value },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

impl AuthError {
    /// Text for the user: the backend's own explanation when there is one.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Gateway(e) => e
                .backend_message()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string()),
            AuthError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
