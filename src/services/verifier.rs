// src/services/verifier.rs
//! Credential verification orchestrator.
//!
//! Drives one verification attempt from the holder's session to a
//! classified [`VerificationResult`]:
//!
//! 1. **Preconditions** (local, no network): a credential is present, it
//!    carries `credentialSubject`, and an issuer DID can be resolved.
//! 2. **Backend call**: `POST /api/verify-credential` through the gateway.
//! 3. **Classification**: hard verified, soft rejection, or transport
//!    failure (see [`VerificationOutcome`](crate::models::verification::VerificationOutcome)).
//!
//! There are no retries. The proof type only annotates the attempt with a
//! [`ProofRequest`]; it never changes the flow.

use crate::error::{GatewayError, VerificationError};
use crate::models::credential::{VerifiableCredential, ZkpData};
use crate::models::did;
use crate::models::proof_request::{ProofRequest, ProofType};
use crate::models::session::UserPayload;
use crate::models::verification::{TrustPolicy, VerificationOutcome, VerificationResult};
use crate::services::api_gateway::ApiGateway;
use serde_json::Value;
use std::sync::Arc;

const VERIFIED_MESSAGE: &str = "Credential verified";
const REJECTED_MESSAGE: &str = "Credential verification failed";

/// Inputs of one verification attempt.
#[derive(Debug, Clone, Default)]
pub struct VerificationRequest<'a> {
    pub credential: Option<&'a VerifiableCredential>,
    /// Issuer chosen by the caller; wins over every fallback.
    pub issuer_did: Option<&'a str>,
    pub zkp_data: Option<&'a ZkpData>,
    /// DID of the session holder, the last issuer fallback.
    pub holder_did: Option<&'a str>,
}

impl<'a> VerificationRequest<'a> {
    /// Request built from the stored session user.
    pub fn from_user(user: &'a UserPayload) -> Self {
        VerificationRequest {
            credential: user.credential.as_ref(),
            issuer_did: None,
            zkp_data: user.zkp_data.as_ref(),
            holder_did: user.did.as_deref(),
        }
    }

    pub fn with_issuer(mut self, issuer_did: Option<&'a str>) -> Self {
        self.issuer_did = issuer_did;
        self
    }

    /// Resolves the issuer DID.
    ///
    /// Order: explicit issuer, `credential.issuer`, `zkpData.identifier`,
    /// `credentialSubject.id`, holder DID. Empty or malformed candidates are
    /// skipped.
    pub fn resolve_issuer(&self) -> Option<&'a str> {
        let credential = self.credential;
        [
            self.issuer_did,
            credential.and_then(VerifiableCredential::issuer_id),
            self.zkp_data.and_then(|z| z.identifier.as_deref()),
            credential.and_then(VerifiableCredential::holder_did),
            self.holder_did,
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty() && did::is_valid(candidate))
    }

    /// Runs the local preconditions in order.
    ///
    /// # Returns
    /// The credential and the resolved issuer DID.
    pub fn check_preconditions(&self) -> Result<(&'a VerifiableCredential, &'a str), VerificationError> {
        let credential = self.credential.ok_or(VerificationError::NoCredential)?;
        if !credential.is_complete() {
            return Err(VerificationError::IncompleteCredential);
        }
        let issuer = self.resolve_issuer().ok_or(VerificationError::NoIssuer)?;
        Ok((credential, issuer))
    }
}

/// A verification attempt together with the proof request it alleges.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReport {
    pub proof_type: ProofType,
    pub proof_request: ProofRequest,
    pub result: VerificationResult,
}

/// Verification over the API gateway.
pub struct CredentialVerifier {
    gateway: Arc<ApiGateway>,
    policy: TrustPolicy,
}

impl CredentialVerifier {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self::with_policy(gateway, TrustPolicy::default())
    }

    pub fn with_policy(gateway: Arc<ApiGateway>, policy: TrustPolicy) -> Self {
        CredentialVerifier { gateway, policy }
    }

    pub fn policy(&self) -> TrustPolicy {
        self.policy
    }

    /// Verifies a credential with the backend.
    ///
    /// # Errors
    /// [`VerificationError`] when a precondition fails; nothing is sent in
    /// that case. Every network outcome, including transport failures and
    /// negative verdicts, comes back as `Ok` with a classified result.
    pub async fn verify(&self, request: &VerificationRequest<'_>) -> Result<VerificationResult, VerificationError> {
        let (credential, issuer) = request.check_preconditions().map_err(|e| {
            log::warn!("[Verify] precondition failed: {}", e);
            e
        })?;

        log::info!(
            "[Verify] verifying credential {} against issuer {}",
            credential.id.as_deref().unwrap_or("<no id>"),
            did::format_short(issuer, did::DEFAULT_TAIL_CHARS)
        );

        let result = match self.gateway.verify_credential(credential, issuer).await {
            Ok(response) => match VerificationResult::from_backend(&response.data) {
                Some(result) => completed(result),
                None => {
                    log::error!("[Verify] verification response from {} is not an object", response.url);
                    VerificationResult::transport_failure(format!("unexpected response from {}", response.url))
                }
            },
            Err(e) => failed(&e),
        };

        log_outcome(&result, self.policy);
        Ok(result)
    }

    /// Verifies the session user's credential.
    pub async fn verify_user(
        &self,
        user: &UserPayload,
        issuer_did: Option<&str>,
    ) -> Result<VerificationResult, VerificationError> {
        self.verify(&VerificationRequest::from_user(user).with_issuer(issuer_did)).await
    }

    /// Verification annotated with the proof request for `proof_type`.
    ///
    /// # Arguments
    /// * `user` - Session user holding the credential
    /// * `issuer_did` - Optional explicit issuer
    /// * `proof_type` - What the attempt alleges to check
    pub async fn prove(
        &self,
        user: &UserPayload,
        issuer_did: Option<&str>,
        proof_type: ProofType,
    ) -> Result<VerificationReport, VerificationError> {
        let request = VerificationRequest::from_user(user).with_issuer(issuer_did);
        let (_, issuer) = request.check_preconditions()?;
        let proof_request = ProofRequest::new(&proof_type, issuer, self.gateway.session().clock().now_secs());
        log::debug!(
            "[Verify] {} proof request {} on circuit {}",
            proof_type.label(),
            proof_request.id,
            proof_request.circuit_id
        );

        let result = self.verify(&request).await?;
        Ok(VerificationReport {
            proof_type,
            proof_request,
            result,
        })
    }

    /// Whether `result` unlocks features under the configured policy.
    pub fn is_trusted(&self, result: &VerificationResult) -> bool {
        result.is_trusted(self.policy)
    }
}

/// A 2xx answer: the round trip completed whatever the verdict.
fn completed(mut result: VerificationResult) -> VerificationResult {
    result.success = true;
    if result.message.is_empty() {
        result.message = if result.verified {
            VERIFIED_MESSAGE.to_string()
        } else {
            result.error.clone().unwrap_or_else(|| REJECTED_MESSAGE.to_string())
        };
    }
    result
}

/// A failed call, keeping whatever detail the backend sent.
fn failed(error: &GatewayError) -> VerificationResult {
    if error.is_transport() {
        log::error!("[Verify] no response from backend: {}", error);
    } else {
        log::error!("[Verify] backend refused verification: {}", error);
    }
    let mut result = VerificationResult::transport_failure(
        error.backend_message().map(str::to_string).unwrap_or_else(|| error.to_string()),
    );
    result.stage = error.stage();
    if let Some(message) = error.data().and_then(|d| d.get("message")).and_then(Value::as_str) {
        result.message = message.to_string();
    }
    result
}

fn log_outcome(result: &VerificationResult, policy: TrustPolicy) {
    match result.outcome() {
        VerificationOutcome::HardVerified { trust, .. } => {
            log::info!("[Verify] verified (trust={:?}, accepted={})", trust, result.is_trusted(policy));
            if let Some(warning) = result.warning.as_deref() {
                log::warn!("[Verify] {}", warning);
            }
        }
        VerificationOutcome::SoftRejected { stage, reason } => match stage {
            Some(stage) => log::warn!("[Verify] rejected at {}: {}", stage, reason),
            None => log::warn!("[Verify] rejected: {}", reason),
        },
        VerificationOutcome::TransportFailed { error } => {
            log::error!("[Verify] request failed: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::credential::{CredentialSubject, Issuer};
    use crate::models::verification::VerificationStage;
    use serde_json::json;

    const ISSUER: &str = "did:polygonid:polygon:amoy:issuer";
    const HOLDER: &str = "did:polygonid:polygon:amoy:holder";

    fn credential(issuer: Option<&str>, subject_id: Option<&str>) -> VerifiableCredential {
        VerifiableCredential {
            issuer: issuer.map(Issuer::from),
            credential_subject: Some(CredentialSubject {
                id: subject_id.map(str::to_string),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_precondition_order() {
        let request = VerificationRequest::default();
        assert_eq!(request.check_preconditions(), Err(VerificationError::NoCredential));

        let incomplete = VerifiableCredential::default();
        let request = VerificationRequest {
            credential: Some(&incomplete),
            issuer_did: Some(ISSUER),
            ..Default::default()
        };
        assert_eq!(request.check_preconditions(), Err(VerificationError::IncompleteCredential));

        let anonymous = credential(None, None);
        let request = VerificationRequest {
            credential: Some(&anonymous),
            ..Default::default()
        };
        assert_eq!(request.check_preconditions(), Err(VerificationError::NoIssuer));
    }

    #[test]
    fn test_issuer_fallback_chain() {
        let zkp = ZkpData {
            identifier: Some("did:polygonid:polygon:amoy:zkp".into()),
            ..Default::default()
        };
        let with_issuer = credential(Some(ISSUER), Some(HOLDER));
        let subject_only = credential(None, Some(HOLDER));

        let explicit = VerificationRequest {
            credential: Some(&with_issuer),
            issuer_did: Some("did:example:net:explicit"),
            ..Default::default()
        };
        assert_eq!(explicit.resolve_issuer(), Some("did:example:net:explicit"));

        let from_credential = VerificationRequest {
            credential: Some(&with_issuer),
            zkp_data: Some(&zkp),
            ..Default::default()
        };
        assert_eq!(from_credential.resolve_issuer(), Some(ISSUER));

        let from_zkp = VerificationRequest {
            credential: Some(&subject_only),
            zkp_data: Some(&zkp),
            ..Default::default()
        };
        assert_eq!(from_zkp.resolve_issuer(), Some("did:polygonid:polygon:amoy:zkp"));

        let from_subject = VerificationRequest {
            credential: Some(&subject_only),
            holder_did: Some("did:example:net:session"),
            ..Default::default()
        };
        assert_eq!(from_subject.resolve_issuer(), Some(HOLDER));
    }

    #[test]
    fn test_malformed_candidates_are_skipped() {
        let bad_issuer = credential(Some("  "), Some("not-a-did"));
        let request = VerificationRequest {
            credential: Some(&bad_issuer),
            issuer_did: Some(""),
            holder_did: Some("did:example:net:session"),
            ..Default::default()
        };
        assert_eq!(request.resolve_issuer(), Some("did:example:net:session"));
    }

    #[test]
    fn test_from_user_uses_session_fields() {
        let user = UserPayload {
            did: Some(HOLDER.into()),
            credential: Some(credential(None, None)),
            ..Default::default()
        };
        let request = VerificationRequest::from_user(&user);
        assert!(request.credential.is_some());
        assert_eq!(request.resolve_issuer(), Some(HOLDER));
        assert_eq!(request.with_issuer(Some(ISSUER)).resolve_issuer(), Some(ISSUER));
    }

    #[test]
    fn test_completed_fills_message() {
        let verified = completed(VerificationResult {
            verified: true,
            ..Default::default()
        });
        assert!(verified.success);
        assert_eq!(verified.message, VERIFIED_MESSAGE);

        let rejected = completed(VerificationResult {
            error: Some("revoked".into()),
            ..Default::default()
        });
        assert!(rejected.success && !rejected.verified);
        assert_eq!(rejected.message, "revoked");
    }

    #[test]
    fn test_failed_keeps_backend_detail() {
        let error = GatewayError::BackendRejection {
            status: 500,
            data: json!({"error": "issuer node down", "stage": "onchain-proof", "message": "Verification failed"}),
            url: "http://backend/api/verify-credential".into(),
        };
        let result = failed(&error);
        assert!(!result.success && !result.verified);
        assert_eq!(result.error.as_deref(), Some("issuer node down"));
        assert_eq!(result.stage, Some(VerificationStage::OnChainProof));
        assert_eq!(result.message, "Verification failed");

        let transport = failed(&GatewayError::Transport {
            url: "u".into(),
            message: "connection refused".into(),
            timed_out: false,
        });
        assert!(matches!(transport.outcome(), VerificationOutcome::TransportFailed { .. }));
        assert_eq!(transport.stage, None);
    }
}
