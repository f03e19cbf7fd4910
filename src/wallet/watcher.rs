// src/wallet/watcher.rs
//! Keeps the session in step with the wallet.
//!
//! A wallet that disconnects (`accountsChanged` with no account) ends the
//! session. Account and chain switches are only logged.

use crate::storage::session_store::SessionStore;
use crate::wallet::provider::{WalletEvent, WalletProvider};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Consumes wallet events until the channel closes.
pub async fn watch_wallet_events(mut events: broadcast::Receiver<WalletEvent>, session: Arc<SessionStore>) {
    loop {
        match events.recv().await {
            Ok(WalletEvent::AccountsChanged(None)) => {
                log::info!("[Wallet] disconnected, clearing session");
                session.clear_session();
            }
            Ok(WalletEvent::AccountsChanged(Some(address))) => {
                log::info!("[Wallet] active account changed to {}", address);
            }
            Ok(WalletEvent::ChainChanged(chain_id)) => {
                log::info!("[Wallet] chain changed to {}", chain_id);
            }
            Err(RecvError::Lagged(missed)) => {
                log::warn!("[Wallet] watcher lagged, {} events dropped", missed);
            }
            Err(RecvError::Closed) => {
                log::debug!("[Wallet] event channel closed, watcher stopping");
                return;
            }
        }
    }
}

/// Spawns [`watch_wallet_events`] for `wallet` on the current runtime.
pub fn spawn_session_watcher(wallet: &dyn WalletProvider, session: Arc<SessionStore>) -> JoinHandle<()> {
    tokio::spawn(watch_wallet_events(wallet.subscribe(), session))
}
