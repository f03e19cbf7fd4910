// src/cli.rs
//! # CLI Interface
//!
//! Command-line structure of `zkp-identity`, built with `clap` derive.

use clap::{Parser, Subcommand};
use zkp_identity_client::models::proof_request::{CombinedConditions, ProofType};

/// ZKP identity client.
///
/// Registers and logs in against the identity backend, keeps the session
/// between invocations and verifies the stored credential.
#[derive(Parser, Debug)]
#[command(
    name = "zkp-identity",
    about = "DID/VC identity client",
    version,
    propagate_version = true
)]
pub struct ZkpIdentityCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register an email/password account and receive a DID.
    Register(RegisterArgs),
    /// Log in with email and password.
    Login(LoginArgs),
    /// Log in with the key-backed development wallet.
    WalletLogin(WalletLoginArgs),
    /// Verify the stored credential with the backend.
    Verify(VerifyArgs),
    /// Show the current session.
    Status,
    /// End the session.
    Logout,
    /// Show the components of a DID.
    Did(DidArgs),
}

#[derive(Parser, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    /// Account password (at least 6 characters).
    #[arg(long, env = "ZKP_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "ZKP_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Parser, Debug)]
pub struct WalletLoginArgs {
    /// Hex-encoded secp256k1 private key of the development wallet.
    #[arg(long, env = "ZKP_WALLET_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
    /// Use a freshly generated key when no private key is configured.
    #[arg(long)]
    pub generate: bool,
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// What the verification alleges to check: `is-verified`,
    /// `auth-method=<method>`, `account-state=<state>`, `account-age=<days>`
    /// or `combined=<key:value,...>`.
    #[arg(long, default_value = "is-verified", value_parser = parse_proof_type)]
    pub proof_type: ProofType,

    /// Issuer DID to verify against instead of the resolved one.
    #[arg(long)]
    pub issuer: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DidArgs {
    pub did: String,
}

/// Parses the `--proof-type` argument.
pub fn parse_proof_type(raw: &str) -> Result<ProofType, String> {
    let (kind, value) = match raw.split_once('=') {
        Some((kind, value)) => (kind, Some(value)),
        None => (raw, None),
    };
    let required = |value: Option<&str>| {
        value
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| format!("{} needs a value, e.g. {}=<value>", kind, kind))
    };

    match kind {
        "is-verified" => Ok(ProofType::IsVerified),
        "auth-method" => Ok(ProofType::AuthMethod(required(value)?)),
        "account-state" => Ok(ProofType::AccountState(required(value)?)),
        "account-age" => {
            let days = required(value)?;
            let min_days = days.parse().map_err(|_| format!("invalid day count {:?}", days))?;
            Ok(ProofType::AccountAge { min_days })
        }
        "combined" => parse_combined(&required(value)?).map(ProofType::Combined),
        other => Err(format!("unknown proof type {:?}", other)),
    }
}

fn parse_combined(raw: &str) -> Result<CombinedConditions, String> {
    let mut conditions = CombinedConditions::default();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = part
            .split_once(':')
            .ok_or_else(|| format!("expected key:value, got {:?}", part))?;
        match key {
            "verified" => {
                conditions.is_verified = Some(value.parse().map_err(|_| format!("invalid bool {:?}", value))?)
            }
            "state" => conditions.account_state = Some(value.to_string()),
            "method" => conditions.auth_method = Some(value.to_string()),
            "age" => conditions.min_age_days = Some(value.parse().map_err(|_| format!("invalid day count {:?}", value))?),
            other => return Err(format!("unknown condition {:?}", other)),
        }
    }
    Ok(conditions)
}
