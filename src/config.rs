// src/config.rs
//! Client configuration.
//!
//! Values come from built-in defaults overridden by `ZKP_*` environment
//! variables (a `.env` file is loaded by the binary before this runs):
//!
//! | Variable | Default |
//! |---|---|
//! | `ZKP_BACKEND_URL` | `http://localhost:5000` |
//! | `ZKP_REQUEST_TIMEOUT_SECS` | `10` |
//! | `ZKP_SESSION_DIR` | `.zkp-session` |
//! | `ZKP_REQUIRE_ON_CHAIN` | `false` |

use crate::models::verification::TrustPolicy;
use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SESSION_DIR: &str = ".zkp-session";

/// Settings for the gateway, the session store and verification policy.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base endpoint. Never the issuer node directly.
    pub backend_url: String,
    pub request_timeout_secs: u64,
    /// Directory of the file-backed session slot.
    pub session_dir: PathBuf,
    /// Only accept issuer-node (on-chain) verification results.
    pub require_on_chain: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            session_dir: PathBuf::from(DEFAULT_SESSION_DIR),
            require_on_chain: false,
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    /// Returns `ConfigError` when a variable cannot be parsed or a value is
    /// unusable (empty backend URL, zero timeout).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("ZKP"))
    }

    /// Loads configuration from an explicit environment source.
    pub fn from_environment(source: Environment) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("backend_url", DEFAULT_BACKEND_URL)?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("session_dir", DEFAULT_SESSION_DIR)?
            .set_default("require_on_chain", false)?
            .add_source(source)
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::Message("backend_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn trust_policy(&self) -> TrustPolicy {
        if self.require_on_chain {
            TrustPolicy::RequireOnChain
        } else {
            TrustPolicy::AcceptStructural
        }
    }
}
