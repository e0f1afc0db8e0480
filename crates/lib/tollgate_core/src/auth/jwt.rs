//! JWT token issuance and verification.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::AuthError;
use crate::models::TokenClaims;

/// Default token lifetime: 10080 seconds.
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 10080;

/// Wire payload: user claims plus the registered time claims.
#[derive(Debug, Serialize, Deserialize)]
struct SignedClaims {
    #[serde(flatten)]
    user: TokenClaims,
    iat: i64,
    exp: i64,
}

/// Signs and verifies HS256 access tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: TimeDelta,
}

impl TokenIssuer {
    /// Fails when `lifetime_secs` does not fit a `TimeDelta`.
    pub fn new(secret: &[u8], lifetime_secs: i64) -> Result<Self, AuthError> {
        let lifetime = TimeDelta::try_seconds(lifetime_secs).ok_or_else(|| {
            AuthError::Internal(format!("token lifetime out of range: {lifetime_secs}s"))
        })?;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime,
        })
    }

    /// Token lifetime in seconds.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    /// Sign `claims` with an expiry of now + lifetime.
    pub fn issue(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.lifetime)
            .ok_or_else(|| AuthError::Internal("token expiry out of range".into()))?;
        let payload = SignedClaims {
            user: claims.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Check signature and expiry, returning the embedded user claims.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        decode::<SignedClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.user)
            .map_err(|e| {
                debug!(reason = %e, "token rejected");
                AuthError::InvalidToken
            })
    }
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("lifetime_secs", &self.lifetime_secs())
            .finish_non_exhaustive()
    }
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    load_or_create_secret(&jwt_secret_path())
}

/// Read the secret at `path`, generating and persisting a new one if absent.
pub fn load_or_create_secret(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match std::fs::write(path, &secret) {
        Ok(()) => info!(path = %path.display(), "generated new JWT secret"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not persist JWT secret"),
    }
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tollgate")
        .join("jwt-secret")
}
