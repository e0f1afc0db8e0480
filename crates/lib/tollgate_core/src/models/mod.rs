//! Domain models.

pub mod user;

pub use user::{NewUser, Profile, Role, TokenClaims, User};
