//! Password hashing via Argon2id, with verification of legacy bcrypt hashes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

use super::AuthError;

/// Default Argon2 memory cost in KiB (19 MiB).
pub const DEFAULT_MEMORY_KIB: u32 = 19 * 1024;
/// Default Argon2 iteration count.
pub const DEFAULT_ITERATIONS: u32 = 2;
/// Default Argon2 lane count.
pub const DEFAULT_PARALLELISM: u32 = 1;

/// bcrypt prefixes accepted for existing hashes.
const BCRYPT_PREFIXES: [&str; 4] = ["$2a$", "$2b$", "$2x$", "$2y$"];

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: DEFAULT_MEMORY_KIB,
            iterations: DEFAULT_ITERATIONS,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

/// One-way password hasher.
///
/// New hashes are Argon2id PHC strings with a fresh random salt. `compare`
/// also accepts bcrypt hashes so accounts created before the switch keep
/// working.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    /// Build a hasher, rejecting parameters Argon2 cannot run with.
    pub fn new(params: HashParams) -> Result<Self, AuthError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )
        .map_err(|e| AuthError::Internal(format!("argon2 params: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Internal(format!("argon2 hash: {e}")))
    }

    /// Check a password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`. Errors are reserved for malformed hashes.
    pub fn compare(&self, plaintext: &str, hash: &str) -> Result<bool, AuthError> {
        if is_legacy_hash(hash) {
            return bcrypt::verify(plaintext, hash)
                .map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")));
        }

        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("argon2 parse: {e}")))?;
        match self.argon2().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::Internal(format!("argon2 verify: {e}"))),
        }
    }

    /// [`hash`](Self::hash) on the blocking thread pool.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Internal(format!("hash task: {e}")))?
    }

    /// [`compare`](Self::compare) on the blocking thread pool.
    pub async fn compare_blocking(
        &self,
        plaintext: String,
        hash: String,
    ) -> Result<bool, AuthError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.compare(&plaintext, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("compare task: {e}")))?
    }
}

/// Whether `hash` was produced by bcrypt rather than Argon2.
pub fn is_legacy_hash(hash: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| hash.starts_with(p))
}
