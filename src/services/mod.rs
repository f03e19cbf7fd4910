// src/services/mod.rs
//! Client services: the API gateway, the auth actions and credential
//! verification.

pub mod api_gateway;
pub mod auth;
pub mod verifier;
