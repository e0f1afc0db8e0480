//! Request and response bodies.
//!
//! Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tollgate_core::models::{Role, TokenClaims, User};

/// Scheme label prefixed to issued tokens and expected in `Authorization`.
pub const TOKEN_SCHEME: &str = "JWT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// All fields optional so a missing one reaches the service's validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// `"JWT <token>"`
    pub token: String,
    pub user: TokenClaims,
}

impl TokenResponse {
    pub fn new(token: &str, user: TokenClaims) -> Self {
        Self {
            token: format!("{TOKEN_SCHEME} {token}"),
            user,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub first_name: String,
    pub last_name: String,
}

/// Public view of a stored user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub profile: ProfileView,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            profile: ProfileView {
                first_name: user.profile.first_name.clone(),
                last_name: user.profile.last_name.clone(),
            },
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserView,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListUsersQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
