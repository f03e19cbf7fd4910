// src/lib.rs

//! # ZKP Identity Client
//!
//! Client-side core of a login flow backed by decentralized identifiers and
//! verifiable credentials.
//!
//! ## Architecture Overview
//! 1. **Models**: DID codec, credential, session and verification types
//! 2. **Storage**: key-value backends and the TTL-bound session slot
//! 3. **Services**: API gateway, auth actions and the verification orchestrator
//! 4. **Wallet**: wallet capability, key-backed development wallet, session watcher
//!
//! The backend is the only remote party; issuer-node operations are proxied
//! by it.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;
pub mod wallet;

pub use config::ClientConfig;
pub use error::{AuthError, GatewayError, VerificationError, WalletError};
pub use services::api_gateway::ApiGateway;
pub use services::auth::AuthService;
pub use services::verifier::CredentialVerifier;
pub use storage::session_store::SessionStore;
