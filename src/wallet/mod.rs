// src/wallet/mod.rs
//! Wallet integration: the provider capability, a key-backed development
//! wallet and the session watcher.

pub mod key_management;
pub mod provider;
pub mod watcher;
