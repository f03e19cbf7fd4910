// src/storage/mod.rs
//! Storage layer: key-value backends and the session slot built on them.

pub mod kv_store;
pub mod session_store;
