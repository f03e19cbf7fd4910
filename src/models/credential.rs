// src/models/credential.rs
//! Verifiable Credential data model.
//!
//! Mirrors the W3C-shaped credential the backend issues at registration,
//! login and wallet authentication. The client never mutates a credential;
//! it stores it inside the session and sends it back verbatim on every
//! verification request, so unknown fields are preserved through
//! `#[serde(flatten)]` maps.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Verifiable Credential according to the W3C data model.
///
/// Every field is optional on the wire: the backend has shipped several
/// shapes over time, and a credential missing `credentialSubject` must still
/// deserialize so it can be reported as incomplete instead of unreadable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// JSON-LD context: a single URI, a list, or embedded objects. Kept raw.
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    /// Unique URI identifier for the credential
    /// Example: "urn:uuid:123e4567-e89b-12d3-a456-426614174000"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Credential types, e.g. `["VerifiableCredential", "ZKPAuthCredential"]`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub types: Option<OneOrMany<String>>,

    /// Credential issuer, as a bare DID or an object with an `id`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,

    /// ISO-8601 on current backends; kept raw for older ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<Value>,

    /// Claims about the holder. Absent means the issuing step was defective.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_subject: Option<CredentialSubject>,

    /// Issuer proof material (signature, MTP, ...), opaque to the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Value>,

    /// Any field not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A JSON-LD term that may hold one value or a list of them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value).iter(),
            OneOrMany::Many(values) => values.iter(),
        }
    }
}

/// Credential issuer: `"did:..."` or `{"id": "did:...", ...}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Issuer {
    Id(String),
    Object {
        id: String,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Any other shape, passed through untouched.
    Other(Value),
}

impl Issuer {
    /// Issuer DID, `None` for shapes without a string id.
    pub fn id(&self) -> Option<&str> {
        match self {
            Issuer::Id(id) | Issuer::Object { id, .. } => Some(id),
            Issuer::Other(_) => None,
        }
    }
}

impl From<&str> for Issuer {
    fn from(id: &str) -> Self {
        Issuer::Id(id.to_string())
    }
}

/// Claims carried by a credential about its holder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    /// DID of the holder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// `"wallet"` or `"email"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_method: Option<String>,

    /// e.g. `"active"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,

    /// Unix seconds or an ISO-8601 string, depending on backend version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VerifiableCredential {
    /// A credential is usable for verification only when it carries claims.
    pub fn is_complete(&self) -> bool {
        self.credential_subject.is_some()
    }

    /// Issuer DID, whichever shape `issuer` was sent in.
    pub fn issuer_id(&self) -> Option<&str> {
        self.issuer.as_ref().and_then(Issuer::id)
    }

    /// Whether `type` lists `credential_type`.
    pub fn has_type(&self, credential_type: &str) -> bool {
        self.types
            .as_ref()
            .map_or(false, |types| types.iter().any(|t| t == credential_type))
    }

    /// DID of the holder, taken from `credentialSubject.id`.
    pub fn holder_did(&self) -> Option<&str> {
        self.credential_subject.as_ref()?.id.as_deref()
    }
}

/// Zero-knowledge metadata returned next to the credential.
///
/// Only `identifier` is interpreted (it is one of the issuer fallbacks);
/// the remaining fields are displayed by the UI and kept as-is.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ZkpData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
