// src/wallet/key_management.rs
//! Key-backed development wallet.
//!
//! [`LocalWallet`] implements [`WalletProvider`] with an in-process
//! secp256k1 key, so the wallet flow can run without a browser extension
//! (CLI, tests, headless hosts).
//!
//! Uses the following cryptographic primitives:
//! - secp256k1 curve (via `k256` crate)
//! - Keccak-256 hashing and EIP-191 message prefixing (via `ethers-core`)
//!
//! An [`ApprovalPolicy`] stands in for the user's answer to wallet prompts,
//! so rejection paths (EIP-1193 code 4001) can be exercised.

use crate::error::{WalletError, USER_REJECTED_CODE};
use crate::utils::crypto::{address_from_uncompressed_key, from_hex, personal_message_hash, to_hex_prefixed};
use crate::wallet::provider::{WalletEvent, WalletProvider, EVENT_CHANNEL_CAPACITY};
use async_trait::async_trait;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Simulated user answer to wallet prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalPolicy {
    #[default]
    ApproveAll,
    RejectConnection,
    RejectSignatures,
}

/// In-process wallet holding one secp256k1 key.
pub struct LocalWallet {
    /// Securely stored private key (never exposed)
    signing_key: SigningKey,
    address: String,
    policy: Mutex<ApprovalPolicy>,
    balance_wei: Mutex<u128>,
    events: broadcast::Sender<WalletEvent>,
}

impl LocalWallet {
    /// Generates a wallet with a fresh random key.
    pub fn new() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Restores a wallet from a hex private key (with or without `0x`).
    pub fn from_private_key_hex(private_key: &str) -> Result<Self, WalletError> {
        let invalid = |reason: &str| WalletError::Provider {
            code: -32602,
            message: format!("invalid private key: {}", reason),
        };
        let bytes = from_hex(private_key).ok_or_else(|| invalid("not hex"))?;
        let signing_key = SigningKey::from_slice(&bytes).map_err(|_| invalid("not a secp256k1 scalar"))?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = derive_address(signing_key.verifying_key());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        LocalWallet {
            signing_key,
            address,
            policy: Mutex::new(ApprovalPolicy::default()),
            balance_wei: Mutex::new(0),
            events,
        }
    }

    /// Lowercase `0x`-prefixed Ethereum address of the key.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_policy(&self, policy: ApprovalPolicy) {
        if let Ok(mut current) = self.policy.lock() {
            *current = policy;
        }
    }

    fn policy(&self) -> ApprovalPolicy {
        self.policy.lock().map(|p| *p).unwrap_or_default()
    }

    pub fn set_balance_wei(&self, wei: u128) {
        if let Ok(mut balance) = self.balance_wei.lock() {
            *balance = wei;
        }
    }

    /// Signs `message` with EIP-191 prefixing.
    ///
    /// # Returns
    /// `0x`-prefixed 65-byte signature (`r || s || v`, `v` in {27, 28}).
    pub fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let hash = personal_message_hash(message);
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| WalletError::Provider {
                code: -32603,
                message: format!("signing failed: {}", e),
            })?;

        let mut bytes = signature.to_bytes().to_vec();
        bytes.push(recovery_id.to_byte() + 27);
        Ok(to_hex_prefixed(&bytes))
    }

    /// Emits a disconnect notification (`accountsChanged` with no account).
    pub fn disconnect(&self) {
        // No subscribers is fine: notifications are fire-and-forget.
        let _ = self.events.send(WalletEvent::AccountsChanged(None));
    }

    /// Emits an account switch to `address`.
    pub fn switch_account(&self, address: &str) {
        let _ = self
            .events
            .send(WalletEvent::AccountsChanged(Some(address.to_string())));
    }

    /// Emits a chain switch to `chain_id`.
    pub fn switch_chain(&self, chain_id: &str) {
        let _ = self.events.send(WalletEvent::ChainChanged(chain_id.to_string()));
    }
}

impl Default for LocalWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError> {
        if self.policy() == ApprovalPolicy::RejectConnection {
            return Err(WalletError::from_connect_code(USER_REJECTED_CODE, "User rejected the request."));
        }
        Ok(vec![self.address.clone()])
    }

    async fn personal_sign(&self, message: &str, address: &str) -> Result<String, WalletError> {
        if !address.eq_ignore_ascii_case(&self.address) {
            return Err(WalletError::Provider {
                code: 4100,
                message: format!("account {} is not managed by this wallet", address),
            });
        }
        if self.policy() == ApprovalPolicy::RejectSignatures {
            return Err(WalletError::from_sign_code(USER_REJECTED_CODE, "User denied message signature."));
        }
        self.sign_message(message)
    }

    async fn balance(&self, _address: &str) -> Result<String, WalletError> {
        let wei = self.balance_wei.lock().map(|b| *b).unwrap_or(0);
        Ok(format!("0x{:x}", wei))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

fn derive_address(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    // An uncompressed SEC1 point is always 65 bytes with a 0x04 tag.
    address_from_uncompressed_key(point.as_bytes()).unwrap_or_default()
}

/// Recovers the signer address of a `personal_sign` signature.
///
/// # Errors
/// [`WalletError::Provider`] when the signature is malformed or does not
/// recover to a valid key.
pub fn recover_address(message: &str, signature: &str) -> Result<String, WalletError> {
    let malformed = |reason: &str| WalletError::Provider {
        code: -32602,
        message: format!("malformed signature: {}", reason),
    };

    let bytes = from_hex(signature).ok_or_else(|| malformed("not hex"))?;
    if bytes.len() != 65 {
        return Err(malformed("expected 65 bytes"));
    }
    let sig = Signature::from_slice(&bytes[..64]).map_err(|_| malformed("invalid r/s"))?;
    let v = bytes[64];
    let recovery_id = RecoveryId::from_byte(if v >= 27 { v - 27 } else { v })
        .ok_or_else(|| malformed("invalid recovery id"))?;

    let hash = personal_message_hash(message);
    let key = VerifyingKey::recover_from_prehash(&hash, &sig, recovery_id)
        .map_err(|_| malformed("recovery failed"))?;
    Ok(derive_address(&key))
}
