// src/utils/serialization.rs
//! Serialization utilities for the identity client.
//!
//! Provides:
//! - JSON serialization helpers used across the crate
//! - The salted base64 envelope used for the persisted session slot
//!
//! The envelope is an obfuscation layer, not encryption: anyone holding the
//! stored text can decode it. It exists so the slot is not plain JSON and so
//! foreign or corrupted values are rejected on read.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Fixed salt/version prefix of every encoded value.
pub const ENCODING_SALT: &str = "zkp_salt_v1";

const SEPARATOR: char = '.';

/// Serializes a value to a JSON string.
///
/// # Arguments
/// * `data` - The value to serialize (must implement `Serialize`)
///
/// # Returns
/// - `Ok(String)` with JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn serialize<T: Serialize>(data: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(data)
}

/// Deserializes a value from a JSON string.
///
/// # Arguments
/// * `data` - JSON string to deserialize
///
/// # Returns
/// - `Ok(T)` with deserialized value on success
/// - `Err(serde_json::Error)` if deserialization fails
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Encodes a value as `"<salt>.<base64(JSON)>"`.
///
/// # Returns
/// - `Some(text)` on success
/// - `None` if the value cannot be serialized (never panics)
pub fn encode<T: Serialize>(value: &T) -> Option<String> {
    match serialize(value) {
        Ok(json) => Some(format!(
            "{}{}{}",
            ENCODING_SALT,
            SEPARATOR,
            base64::encode(json.as_bytes())
        )),
        Err(e) => {
            log::error!("[Encode] failed to serialize value: {}", e);
            None
        }
    }
}

/// Decodes text produced by [`encode`].
///
/// # Returns
/// `None` when:
/// - the separator is missing
/// - the salt prefix does not match [`ENCODING_SALT`]
/// - the payload is not valid base64, UTF-8 or JSON for `T`
pub fn decode<T: DeserializeOwned>(text: &str) -> Option<T> {
    let (salt, payload) = text.split_once(SEPARATOR)?;
    if salt != ENCODING_SALT {
        log::warn!("[Decode] salt prefix mismatch");
        return None;
    }

    let bytes = match base64::decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("[Decode] invalid base64 payload: {}", e);
            return None;
        }
    };
    let json = String::from_utf8(bytes).ok()?;

    match deserialize(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("[Decode] payload is not the expected JSON: {}", e);
            None
        }
    }
}
