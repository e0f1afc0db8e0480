//! # tollgate_core
//!
//! Core authentication logic for Tollgate: password hashing, token issuance,
//! user storage, and the service that ties them together.

pub mod auth;
pub mod migrate;
pub mod models;
pub mod store;
pub mod uuid;

/// Release of the auth core, logged by the server at startup.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
