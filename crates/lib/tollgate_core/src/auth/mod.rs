//! Authentication logic.
//!
//! Provides password hashing, JWT issuance, and the service that runs the
//! register / login flows against a [`UserStore`](crate::store::UserStore).

pub mod jwt;
pub mod password;
pub mod service;

use thiserror::Error;

use crate::store::StoreError;

pub use jwt::TokenIssuer;
pub use password::PasswordHasher;
pub use service::{AuthService, AuthSession, Credentials, Registration};

/// Shared message for unknown email and wrong password alike.
pub const INVALID_CREDENTIALS_MESSAGE: &str =
    "Your login details could not be verified. Please try again.";

/// Message for a registration whose email is taken.
pub const EMAIL_IN_USE_MESSAGE: &str = "That email address is already in use.";

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{}", EMAIL_IN_USE_MESSAGE)]
    Conflict,

    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("No such user exists!")]
    NotFound,

    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate => AuthError::Conflict,
            other => AuthError::Store(other),
        }
    }
}
