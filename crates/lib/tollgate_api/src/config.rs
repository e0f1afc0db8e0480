//! API server configuration.

use std::fmt;
use std::str::FromStr;

use tollgate_core::auth::jwt::{DEFAULT_TOKEN_LIFETIME_SECS, resolve_jwt_secret};
use tollgate_core::auth::password::HashParams;

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Issued token lifetime in seconds.
    pub token_lifetime_secs: i64,
    /// Argon2 cost for new password hashes.
    pub hash_params: HashParams,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable              | Default                              |
    /// |-----------------------|--------------------------------------|
    /// | `BIND_ADDR`           | `127.0.0.1:3100`                     |
    /// | `DATABASE_URL`        | `postgres://localhost:5432/tollgate` |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file |
    /// | `TOKEN_LIFETIME_SECS` | `10080`                              |
    /// | `ARGON2_MEMORY_KIB`   | `19456`                              |
    /// | `ARGON2_ITERATIONS`   | `2`                                  |
    /// | `ARGON2_PARALLELISM`  | `1`                                  |
    pub fn from_env() -> Self {
        let defaults = HashParams::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:3100".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/tollgate".into()),
            jwt_secret: resolve_jwt_secret(),
            token_lifetime_secs: env_or("TOKEN_LIFETIME_SECS", DEFAULT_TOKEN_LIFETIME_SECS),
            hash_params: HashParams {
                memory_kib: env_or("ARGON2_MEMORY_KIB", defaults.memory_kib),
                iterations: env_or("ARGON2_ITERATIONS", defaults.iterations),
                parallelism: env_or("ARGON2_PARALLELISM", defaults.parallelism),
            },
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("token_lifetime_secs", &self.token_lifetime_secs)
            .field("hash_params", &self.hash_params)
            .finish()
    }
}

/// Parse `name` from the environment, falling back on absence or bad input.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
