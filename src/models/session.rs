// src/models/session.rs
//! Session and authenticated-user data model.

use crate::models::credential::{VerifiableCredential, ZkpData};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Session time-to-live: 24 hours of wall-clock time, in milliseconds.
pub const SESSION_TTL_MS: i64 = 86_400_000;

/// How the user authenticated.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    #[serde(rename = "email-password")]
    EmailPassword,
    #[serde(rename = "wallet")]
    Wallet,
}

/// Authenticated user as stored in the session slot.
///
/// Built from the backend's `{did, user, zkpData, credential, token}`
/// response. Fields the client does not interpret are kept in `extra` so the
/// payload survives an encode/decode round trip untouched.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, alias = "address", skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<VerifiableCredential>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zkp_data: Option<ZkpData>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthMethod>,

    /// Bearer token attached to every authenticated request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPayload {
    /// Human-readable label: name, then email, then wallet address.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .or(self.wallet_address.as_deref())
            .unwrap_or("anonymous")
    }
}

/// Envelope persisted in the session slot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: UserPayload,
    /// Creation or last renewal time, Unix milliseconds.
    pub timestamp: i64,
    pub expires_in: i64,
}

impl Session {
    pub fn new(user: UserPayload, now_ms: i64) -> Self {
        Session {
            user,
            timestamp: now_ms,
            expires_in: SESSION_TTL_MS,
        }
    }

    /// `true` while `now - timestamp <= expiresIn`.
    pub fn is_active_at(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.timestamp) <= self.expires_in
    }
}

/// Body returned by register, login and wallet-auth.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub did: Option<String>,
    #[serde(default)]
    pub user: Option<UserPayload>,
    #[serde(default)]
    pub zkp_data: Option<ZkpData>,
    #[serde(default)]
    pub credential: Option<VerifiableCredential>,
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthResponse {
    /// Flattens the response into the payload stored in the session.
    ///
    /// Top-level `did`, `zkpData`, `credential` and `token` take precedence
    /// over the same fields nested in `user`.
    pub fn into_user_payload(self, auth_type: AuthMethod) -> UserPayload {
        let mut user = self.user.unwrap_or_default();
        if self.did.is_some() {
            user.did = self.did;
        }
        if self.zkp_data.is_some() {
            user.zkp_data = self.zkp_data;
        }
        if self.credential.is_some() {
            user.credential = self.credential;
        }
        if self.token.is_some() {
            user.token = self.token;
        }
        user.auth_type = Some(auth_type);
        user
    }
}
