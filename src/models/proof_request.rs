// src/models/proof_request.rs
//! Proof requests attached to verification attempts.
//!
//! The UI offers several "proof types" (auth method, verified status, account
//! state, ...). They all reduce to the same `verify-credential` call; the proof
//! type only decides which subject query the request claims to check. A
//! [`ProofRequest`] is that annotation, in the circuit-query shape the issuer
//! infrastructure expects.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Circuit used for credential atomic queries with MTP proofs.
pub const ATOMIC_QUERY_CIRCUIT: &str = "credentialAtomicQueryMTPV2";

/// JSON-LD context of the ZKPAuthCredential schema.
pub const AUTH_CREDENTIAL_CONTEXT: &str = "ipfs://QmXAHpXSPcj2J7wreCkKkvvXgT67tbQDvFxmTHudXQYBEp";

pub const AUTH_CREDENTIAL_TYPE: &str = "ZKPAuthCredential";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Conditions combined into a single query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CombinedConditions {
    pub is_verified: Option<bool>,
    pub account_state: Option<String>,
    pub auth_method: Option<String>,
    pub min_age_days: Option<u32>,
}

/// What the UI alleges to be checking.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProofType {
    /// `authMethod == <method>` (`"wallet"` or `"email"`).
    AuthMethod(String),
    /// `isVerified == true`.
    #[default]
    IsVerified,
    /// `accountState == <state>`.
    AccountState(String),
    /// Registered at least `min_days` days ago.
    AccountAge { min_days: u32 },
    Combined(CombinedConditions),
}

impl ProofType {
    /// Builds the `credentialSubject` query for this proof type.
    ///
    /// # Arguments
    /// * `now_secs` - Current Unix time in seconds, used by age conditions
    pub fn subject_query(&self, now_secs: i64) -> Value {
        let mut query = Map::new();
        match self {
            ProofType::AuthMethod(method) => {
                query.insert("authMethod".into(), json!({ "$eq": method }));
            }
            ProofType::IsVerified => {
                query.insert("isVerified".into(), json!({ "$eq": true }));
            }
            ProofType::AccountState(state) => {
                query.insert("accountState".into(), json!({ "$eq": state }));
            }
            ProofType::AccountAge { min_days } => {
                query.insert(
                    "registrationDate".into(),
                    json!({ "$lt": registered_before(now_secs, *min_days) }),
                );
            }
            ProofType::Combined(conditions) => {
                if let Some(is_verified) = conditions.is_verified {
                    query.insert("isVerified".into(), json!({ "$eq": is_verified }));
                }
                if let Some(state) = &conditions.account_state {
                    query.insert("accountState".into(), json!({ "$eq": state }));
                }
                if let Some(method) = &conditions.auth_method {
                    query.insert("authMethod".into(), json!({ "$eq": method }));
                }
                if let Some(days) = conditions.min_age_days.filter(|d| *d > 0) {
                    query.insert(
                        "registrationDate".into(),
                        json!({ "$lt": registered_before(now_secs, days) }),
                    );
                }
            }
        }
        Value::Object(query)
    }

    /// Short label used in logs and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            ProofType::AuthMethod(_) => "auth-method",
            ProofType::IsVerified => "is-verified",
            ProofType::AccountState(_) => "account-state",
            ProofType::AccountAge { .. } => "account-age",
            ProofType::Combined(_) => "combined",
        }
    }
}

fn registered_before(now_secs: i64, min_days: u32) -> i64 {
    now_secs - i64::from(min_days) * SECONDS_PER_DAY
}

/// Query section of a proof request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofQuery {
    pub allowed_issuers: Vec<String>,
    pub context: String,
    #[serde(rename = "type")]
    pub credential_type: String,
    pub credential_subject: Value,
}

/// Circuit query describing one proof attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest {
    pub circuit_id: String,
    pub id: u32,
    pub query: ProofQuery,
}

impl ProofRequest {
    pub fn new(proof_type: &ProofType, issuer_did: &str, now_secs: i64) -> Self {
        ProofRequest {
            circuit_id: ATOMIC_QUERY_CIRCUIT.to_string(),
            id: rand::thread_rng().gen_range(0..1_000_000),
            query: ProofQuery {
                allowed_issuers: vec![issuer_did.to_string()],
                context: AUTH_CREDENTIAL_CONTEXT.to_string(),
                credential_type: AUTH_CREDENTIAL_TYPE.to_string(),
                credential_subject: proof_type.subject_query(now_secs),
            },
        }
    }
}
