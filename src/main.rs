// src/main.rs

//! # ZKP Identity Client - Main Entry Point
//!
//! Command-line front end of the identity client. Each invocation loads the
//! configuration, opens the file-backed session slot and runs one command.
//!
//! ## Environment Variables
//! - `ZKP_BACKEND_URL`: backend base URL (default: http://localhost:5000)
//! - `ZKP_REQUEST_TIMEOUT_SECS`: request timeout in seconds (default: 10)
//! - `ZKP_SESSION_DIR`: session directory (default: .zkp-session)
//! - `ZKP_REQUIRE_ON_CHAIN`: only trust issuer-node verification (default: false)
//! - `RUST_LOG`: log filter (default: info)

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Commands, ZkpIdentityCli};
use dotenv::dotenv;
use std::sync::Arc;
use zkp_identity_client::models::did;
use zkp_identity_client::models::session::UserPayload;
use zkp_identity_client::models::verification::VerificationOutcome;
use zkp_identity_client::services::verifier::VerificationReport;
use zkp_identity_client::storage::kv_store::FileStore;
use zkp_identity_client::wallet::key_management::LocalWallet;
use zkp_identity_client::wallet::provider::{wallet_balance_eth, WalletProvider};
use zkp_identity_client::{ApiGateway, AuthService, ClientConfig, CredentialVerifier, SessionStore};

/// Application entry point
///
/// # Initialization Sequence
/// 1. Load `.env` and initialize logging
/// 2. Load configuration
/// 3. Open the session slot and build the gateway
/// 4. Run the requested command
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = ZkpIdentityCli::parse();

    let config = ClientConfig::from_env().context("invalid ZKP_* configuration")?;
    log::debug!("backend={} session_dir={}", config.backend_url, config.session_dir.display());

    let session = Arc::new(SessionStore::new(Arc::new(FileStore::new(config.session_dir.clone()))));
    let gateway = Arc::new(
        ApiGateway::from_config(&config, session.clone()).context("failed to initialize API gateway")?,
    );
    let auth = AuthService::new(gateway.clone());

    match cli.command {
        Commands::Register(args) => {
            let user = auth
                .register(&args.name, &args.email, &args.password)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("registration failed")?;
            println!("Registered {}", user.display_name());
            print_user(&user);
        }
        Commands::Login(args) => {
            let user = auth
                .login(&args.email, &args.password)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("login failed")?;
            println!("Logged in as {}", user.display_name());
            print_user(&user);
        }
        Commands::WalletLogin(args) => {
            let wallet = match (args.private_key.as_deref(), args.generate) {
                (Some(key), _) => Some(LocalWallet::from_private_key_hex(key).context("invalid wallet key")?),
                (None, true) => Some(LocalWallet::new()),
                (None, false) => None,
            };
            let provider = wallet.as_ref().map(|w| w as &dyn WalletProvider);
            let user = auth
                .authenticate_with_wallet(provider)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("wallet login failed")?;
            if let Some(wallet) = &wallet {
                println!("Logged in with wallet {}", wallet.address());
                if let Ok(balance) = wallet_balance_eth(wallet, wallet.address()).await {
                    println!("Balance: {} ETH", balance);
                }
            }
            print_user(&user);
        }
        Commands::Verify(args) => {
            let Some(user) = auth.current_user() else {
                bail!("not logged in");
            };
            let verifier = CredentialVerifier::with_policy(gateway.clone(), config.trust_policy());
            let report = verifier
                .prove(&user, args.issuer.as_deref(), args.proof_type)
                .await
                .context("verification could not start")?;
            print_report(&report, verifier.is_trusted(&report.result))?;
        }
        Commands::Status => match session.read_session() {
            Some(current) => {
                let expires_at = chrono::DateTime::from_timestamp_millis(current.timestamp + current.expires_in)
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default();
                println!("Logged in as {} (until {})", current.user.display_name(), expires_at);
                print_user(&current.user);
            }
            None => println!("Not logged in"),
        },
        Commands::Logout => {
            auth.logout().await;
            println!("Logged out");
        }
        Commands::Did(args) => {
            let info = did::display_info(&args.did);
            println!("{}", serde_json::to_string_pretty(&info)?);
            if !info.valid {
                bail!("{:?} is not a valid DID", args.did);
            }
        }
    }

    Ok(())
}

fn print_user(user: &UserPayload) {
    match user.did.as_deref() {
        Some(value) => println!("DID: {}", did::format_short(value, did::DEFAULT_TAIL_CHARS)),
        None => println!("DID: <none>"),
    }
    if let Some(address) = user.wallet_address.as_deref() {
        println!("Wallet: {}", address);
    }
    println!("Credential: {}", if user.credential.is_some() { "present" } else { "missing" });
}

fn print_report(report: &VerificationReport, trusted: bool) -> Result<()> {
    let result = &report.result;
    println!("Proof type: {} (request {})", report.proof_type.label(), report.proof_request.id);

    match result.outcome() {
        VerificationOutcome::HardVerified { proof, trust } => {
            println!("Verified: {}", result.message);
            if let Some(proof) = proof {
                println!("Method: {}", String::from(proof.method.clone()));
                if let Some(not_revoked) = proof.not_revoked {
                    println!("Not revoked: {}", not_revoked);
                }
            }
            println!("Trust: {:?} ({})", trust, if trusted { "accepted" } else { "not accepted by policy" });
            if let Some(warning) = result.warning.as_deref() {
                println!("Warning: {}", warning);
            }
        }
        VerificationOutcome::SoftRejected { stage, reason } => {
            match stage {
                Some(stage) => println!("Not verified at {}: {}", stage, reason),
                None => println!("Not verified: {}", reason),
            }
        }
        VerificationOutcome::TransportFailed { error } => {
            bail!("verification request failed: {}", error);
        }
    }

    if let Some(full_data) = result.full_data.as_ref() {
        println!("{}", serde_json::to_string_pretty(full_data)?);
    }
    Ok(())
}
