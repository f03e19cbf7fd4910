// src/utils/crypto.rs
//! Ethereum-compatible hashing and encoding helpers for wallet signatures.
//!
//! Keccak-256 is the hash behind addresses and EIP-191 message digests.

use ethers_core::utils::{hash_message, hex, keccak256};

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// EIP-191 digest signed by `personal_sign`:
/// `keccak256("\x19Ethereum Signed Message:\n" + len + message)`.
pub fn personal_message_hash(message: &str) -> [u8; 32] {
    hash_message(message).0
}

/// Derives the `0x`-prefixed Ethereum address of an uncompressed SEC1
/// public key (65 bytes, leading `0x04`).
pub fn address_from_uncompressed_key(public_key: &[u8]) -> Option<String> {
    if public_key.len() != 65 || public_key[0] != 0x04 {
        return None;
    }
    let hash = hash_data(&public_key[1..]);
    Some(format!("0x{}", hex::encode(&hash[12..])))
}

/// Lowercase hex with `0x` prefix.
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decodes hex with or without a `0x` prefix.
pub fn from_hex(value: &str) -> Option<Vec<u8>> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(trimmed).ok()
}
