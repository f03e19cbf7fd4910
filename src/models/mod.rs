// src/models/mod.rs
//! Data structures shared across the client core.

pub mod credential;
pub mod did;
pub mod proof_request;
pub mod session;
pub mod verification;
