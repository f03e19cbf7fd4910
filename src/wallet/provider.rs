// src/wallet/provider.rs
//! Wallet capability consumed by the client.
//!
//! The browser wallet extension is an external collaborator; the client only
//! needs four capabilities from it: list accounts, sign a personal message,
//! report account/chain changes, and (for display) read a balance.
//!
//! Change notifications are delivered over a `tokio::sync::broadcast`
//! channel: at-most-once per change, no buffering guarantee beyond the
//! channel capacity, and a lagging subscriber silently loses events.

use crate::error::WalletError;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Capacity of wallet event channels.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Change notifications emitted by a wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// Active account changed. `None` means the wallet disconnected.
    AccountsChanged(Option<String>),
    /// Active chain changed (hex chain id, e.g. `"0x13882"`).
    ChainChanged(String),
}

/// Request/sign surface of a wallet (EIP-1193 style).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_requestAccounts`. User rejection maps to
    /// [`WalletError::ConnectionRejected`].
    async fn request_accounts(&self) -> Result<Vec<String>, WalletError>;

    /// `personal_sign`. Returns a `0x`-prefixed 65-byte signature. User
    /// rejection maps to [`WalletError::SignatureRejected`].
    async fn personal_sign(&self, message: &str, address: &str) -> Result<String, WalletError>;

    /// `eth_getBalance` at `latest`, as a hex wei quantity.
    async fn balance(&self, address: &str) -> Result<String, WalletError>;

    /// Subscribes to account and chain changes.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

/// Converts a hex wei quantity (`"0x..."`) into ETH with four decimals.
///
/// Truncates toward zero, e.g. `0xde0b6b3a7640000` → `"1.0000"`.
pub fn format_wei_as_eth(hex_wei: &str) -> Result<String, WalletError> {
    let digits = hex_wei.strip_prefix("0x").unwrap_or(hex_wei);
    let wei = u128::from_str_radix(if digits.is_empty() { "0" } else { digits }, 16).map_err(|e| {
        WalletError::Provider {
            code: -32602,
            message: format!("invalid balance {:?}: {}", hex_wei, e),
        }
    })?;

    const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;
    const WEI_PER_UNIT: u128 = WEI_PER_ETH / 10_000;
    let whole = wei / WEI_PER_ETH;
    let fraction = (wei % WEI_PER_ETH) / WEI_PER_UNIT;
    Ok(format!("{}.{:04}", whole, fraction))
}

/// Wallet balance formatted in ETH.
pub async fn wallet_balance_eth(wallet: &dyn WalletProvider, address: &str) -> Result<String, WalletError> {
    let hex_wei = wallet.balance(address).await?;
    format_wei_as_eth(&hex_wei)
}
