// src/models/verification.rs
//! Verification result model.
//!
//! `VerificationResult` is both the wire shape returned by
//! `POST /api/verify-credential` and the value handed back to the UI. The
//! orchestrator classifies it into a [`VerificationOutcome`] so callers
//! match on a closed set of terminal states instead of probing fields.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// How the backend established a positive result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProofMethod {
    /// Checked against the issuer node's on-chain state.
    IssuerNode,
    /// Structural check of the credential only.
    Structure,
    Other(String),
}

impl From<String> for ProofMethod {
    fn from(value: String) -> Self {
        match value.as_str() {
            "issuer-node" => ProofMethod::IssuerNode,
            "structure" => ProofMethod::Structure,
            _ => ProofMethod::Other(value),
        }
    }
}

impl From<ProofMethod> for String {
    fn from(method: ProofMethod) -> Self {
        match method {
            ProofMethod::IssuerNode => "issuer-node".to_string(),
            ProofMethod::Structure => "structure".to_string(),
            ProofMethod::Other(value) => value,
        }
    }
}

/// Trust carried by a positive result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    OnChain,
    Structural,
}

/// Which results unlock features that require a verified identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Any `verified=true` result is accepted.
    #[default]
    AcceptStructural,
    /// Only issuer-node (on-chain) results are accepted.
    RequireOnChain,
}

/// Issuer claims-tree inclusion proof summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IssuerMtp {
    #[serde(default)]
    pub existence: bool,
    #[serde(default, alias = "siblings")]
    pub siblings_count: usize,
}

/// Nested cryptographic detail of an issuer-node proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CryptographicProof {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_claim: Option<String>,
    #[serde(default, alias = "mtp", skip_serializing_if = "Option::is_none")]
    pub issuer_mtp: Option<IssuerMtp>,
}

/// Proof summary attached to a `verified=true` answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationProof {
    pub method: ProofMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_revoked: Option<bool>,
    /// ISO-8601 string or Unix milliseconds, depending on backend version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cryptographic_proof: Option<CryptographicProof>,
}

/// Verification phase that rejected a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VerificationStage {
    CredentialShape,
    IssuerResolution,
    Revocation,
    OnChainProof,
    Other(String),
}

impl From<String> for VerificationStage {
    fn from(value: String) -> Self {
        match value.as_str() {
            "credential-shape" => VerificationStage::CredentialShape,
            "issuer-resolution" => VerificationStage::IssuerResolution,
            "revocation" => VerificationStage::Revocation,
            "onchain-proof" => VerificationStage::OnChainProof,
            _ => VerificationStage::Other(value),
        }
    }
}

impl From<VerificationStage> for String {
    fn from(stage: VerificationStage) -> Self {
        match stage {
            VerificationStage::CredentialShape => "credential-shape".to_string(),
            VerificationStage::IssuerResolution => "issuer-resolution".to_string(),
            VerificationStage::Revocation => "revocation".to_string(),
            VerificationStage::OnChainProof => "onchain-proof".to_string(),
            VerificationStage::Other(value) => value,
        }
    }
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

/// Tagged outcome of one verification attempt.
///
/// `success` reports whether the round trip completed; `verified` reports
/// the backend's verdict. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<VerificationProof>,
    /// Full backend trace, displayed as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_data: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<VerificationStage>,
    /// `proof` exactly as received, kept even when it does not fit
    /// [`VerificationProof`].
    #[serde(skip)]
    pub raw_proof: Option<Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Non-null field of a JSON object.
fn field<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.get(key).filter(|value| !value.is_null())
}

/// Text of a field; non-string values are rendered as JSON.
fn field_text(data: &Value, key: &str) -> Option<String> {
    field(data, key).map(|value| match value.as_str() {
        Some(text) => text.to_string(),
        None => value.to_string(),
    })
}

/// Terminal states of the network phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerificationOutcome<'a> {
    HardVerified {
        proof: Option<&'a VerificationProof>,
        trust: Option<TrustLevel>,
    },
    SoftRejected {
        stage: Option<&'a VerificationStage>,
        reason: &'a str,
    },
    TransportFailed {
        error: &'a str,
    },
}

impl VerificationResult {
    /// Reads a backend answer field by field.
    ///
    /// A field with an unexpected type is dropped on its own instead of
    /// invalidating the whole answer: the verdict, `stage` and reason always
    /// survive. A `proof` that does not fit [`VerificationProof`] is still
    /// exposed through `raw_proof`.
    ///
    /// # Returns
    /// `None` when `data` is not a JSON object.
    pub fn from_backend(data: &Value) -> Option<Self> {
        if !data.is_object() {
            return None;
        }

        let flag = |key: &str| field(data, key).and_then(Value::as_bool).unwrap_or(false);
        let raw_proof = field(data, "proof").cloned();
        let proof = raw_proof.as_ref().and_then(|raw| {
            serde_json::from_value::<VerificationProof>(raw.clone())
                .map_err(|e| log::warn!("[Verify] proof summary kept raw: {}", e))
                .ok()
        });

        Some(VerificationResult {
            success: flag("success"),
            verified: flag("verified"),
            proof,
            full_data: field(data, "fullData").cloned(),
            message: field_text(data, "message").unwrap_or_default(),
            warning: field_text(data, "warning"),
            error: field_text(data, "error"),
            stage: field(data, "stage")
                .and_then(Value::as_str)
                .map(|stage| VerificationStage::from(stage.to_string())),
            raw_proof,
        })
    }

    /// Result for a call that never produced a usable backend answer.
    pub fn transport_failure(error: impl Into<String>) -> Self {
        let error = error.into();
        VerificationResult {
            success: false,
            verified: false,
            message: format!("Verification request failed: {}", error),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn outcome(&self) -> VerificationOutcome<'_> {
        if !self.success {
            return VerificationOutcome::TransportFailed {
                error: self.error.as_deref().unwrap_or(&self.message),
            };
        }
        if self.verified {
            return VerificationOutcome::HardVerified {
                proof: self.proof.as_ref(),
                trust: self.trust_level(),
            };
        }
        VerificationOutcome::SoftRejected {
            stage: self.stage.as_ref(),
            reason: self.error.as_deref().unwrap_or(&self.message),
        }
    }

    /// Trust level of a positive result, `None` for anything else.
    ///
    /// A verified answer without a proof summary is treated as structural.
    pub fn trust_level(&self) -> Option<TrustLevel> {
        if !(self.success && self.verified) {
            return None;
        }
        match self.proof.as_ref().map(|p| &p.method) {
            Some(ProofMethod::IssuerNode) => Some(TrustLevel::OnChain),
            _ => Some(TrustLevel::Structural),
        }
    }

    /// Whether this result satisfies `policy`.
    pub fn is_trusted(&self, policy: TrustPolicy) -> bool {
        match (policy, self.trust_level()) {
            (_, None) => false,
            (TrustPolicy::AcceptStructural, Some(_)) => true,
            (TrustPolicy::RequireOnChain, Some(level)) => level == TrustLevel::OnChain,
        }
    }
}
