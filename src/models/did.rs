// src/models/did.rs
//! Decentralized Identifier (DID) codec.
//!
//! Parses, validates and formats DID strings of the shape
//! `did:<method>:<network>:<identifier>`, e.g.
//! `did:polygonid:polygon:amoy:2qXYZ...`.
//!
//! Every function in this module is pure and never panics. Invalid input is
//! reported as a value (`false`, `None` or the `"Invalid DID"` sentinel),
//! and an invalid DID never yields partial components.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Grammar accepted for a DID. Method and network are ASCII alphanumeric in
/// either case, the identifier is everything after the third colon.
static DID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[dD][iI][dD]:[a-zA-Z0-9]+:[a-zA-Z0-9]+:.+$").expect("DID pattern is a valid regex")
});

/// Default number of identifier characters kept by [`format_short`].
pub const DEFAULT_TAIL_CHARS: usize = 8;

/// Sentinel returned by [`format_short`] for invalid input.
pub const INVALID_DID: &str = "Invalid DID";

/// Returns `true` iff `value` matches the DID grammar.
pub fn is_valid(value: &str) -> bool {
    DID_PATTERN.is_match(value)
}

/// Same check as [`is_valid`] for an arbitrary JSON value.
///
/// Non-string values (numbers, objects, `null`) are invalid rather than errors.
pub fn is_valid_value(value: &serde_json::Value) -> bool {
    value.as_str().map(is_valid).unwrap_or(false)
}

/// Components of a valid DID, borrowed from the original string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDid<'a> {
    pub full: &'a str,
    pub method: &'a str,
    pub network: &'a str,
    pub identifier: &'a str,
}

/// Splits a DID into its components.
///
/// # Returns
/// - `Some(ParsedDid)` when the whole string matches the grammar
/// - `None` otherwise; no partial result is ever produced
pub fn parse(did: &str) -> Option<ParsedDid<'_>> {
    if !is_valid(did) {
        return None;
    }

    // The grammar guarantees exactly three colons before the identifier,
    // and the identifier may carry further colons of its own.
    let mut parts = did.splitn(4, ':');
    let _scheme = parts.next()?;
    let method = parts.next()?;
    let network = parts.next()?;
    let identifier = parts.next()?;

    Some(ParsedDid {
        full: did,
        method,
        network,
        identifier,
    })
}

/// Method segment (`polygonid`, `ethr`, `key`, ...) of a valid DID.
pub fn method(did: &str) -> Option<&str> {
    parse(did).map(|p| p.method)
}

/// Network segment of a valid DID.
pub fn network(did: &str) -> Option<&str> {
    parse(did).map(|p| p.network)
}

/// Identifier of a valid DID: everything after the third colon.
pub fn identifier(did: &str) -> Option<&str> {
    parse(did).map(|p| p.identifier)
}

/// Formats a DID for compact display.
///
/// # Arguments
/// * `did` - DID to format
/// * `tail_chars` - Number of trailing identifier characters to keep
///
/// # Returns
/// - `"did:...<tail>"` when the identifier is longer than `tail_chars`
/// - the full DID when the identifier is short enough
/// - [`INVALID_DID`] when `did` is not a valid DID
pub fn format_short(did: &str, tail_chars: usize) -> String {
    let Some(parsed) = parse(did) else {
        return INVALID_DID.to_string();
    };

    let char_count = parsed.identifier.chars().count();
    if char_count <= tail_chars {
        return did.to_string();
    }

    let tail: String = parsed
        .identifier
        .chars()
        .skip(char_count - tail_chars)
        .collect();
    format!("did:...{}", tail)
}

/// Aggregate view of a DID for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DidDisplayInfo {
    pub valid: bool,
    pub short: String,
    pub full: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

/// Builds the presentation view of a DID.
///
/// An invalid DID yields only `valid = false`, `short = "Invalid"` and the
/// untouched input as `full`.
pub fn display_info(did: &str) -> DidDisplayInfo {
    match parse(did) {
        Some(parsed) => DidDisplayInfo {
            valid: true,
            short: format_short(did, DEFAULT_TAIL_CHARS),
            full: did.to_string(),
            method: Some(parsed.method.to_string()),
            network: Some(parsed.network.to_string()),
            identifier: Some(parsed.identifier.to_string()),
        },
        None => DidDisplayInfo {
            valid: false,
            short: "Invalid".to_string(),
            full: did.to_string(),
            method: None,
            network: None,
            identifier: None,
        },
    }
}

/// `true` iff both DIDs are valid and equal ignoring ASCII case.
pub fn equals(a: &str, b: &str) -> bool {
    is_valid(a) && is_valid(b) && a.eq_ignore_ascii_case(b)
}

/// A validated DID string.
///
/// Construction goes through [`FromStr`] (or serde), so holding a `Did`
/// means the grammar has already been checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did(String);

/// Error returned when a string does not follow the DID grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid DID: {0:?}")]
pub struct InvalidDid(pub String);

impl Did {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn method(&self) -> &str {
        self.parts().method
    }

    pub fn network(&self) -> &str {
        self.parts().network
    }

    pub fn identifier(&self) -> &str {
        self.parts().identifier
    }

    pub fn short(&self) -> String {
        format_short(&self.0, DEFAULT_TAIL_CHARS)
    }

    fn parts(&self) -> ParsedDid<'_> {
        // Invariant: the inner string was validated on construction.
        parse(&self.0).unwrap_or(ParsedDid {
            full: &self.0,
            method: "",
            network: "",
            identifier: "",
        })
    }
}

impl FromStr for Did {
    type Err = InvalidDid;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_valid(s) {
            Ok(Did(s.to_string()))
        } else {
            Err(InvalidDid(s.to_string()))
        }
    }
}

impl TryFrom<String> for Did {
    type Error = InvalidDid;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid(&value) {
            Ok(Did(value))
        } else {
            Err(InvalidDid(value))
        }
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.0
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
