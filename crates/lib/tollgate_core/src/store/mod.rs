//! User persistence.
//!
//! [`UserStore`] is the narrow interface the auth service talks to. Emails are
//! matched case-insensitively, and uniqueness is enforced by the store itself so
//! two concurrent inserts for one address cannot both succeed.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewUser, User};

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

/// Default page size for [`UserStore::list`].
pub const DEFAULT_PAGE_LIMIT: i64 = 50;
/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique constraint on email violated at insert time.
    #[error("duplicate email")]
    Duplicate,

    #[error("Database error: {0}")]
    Db(sqlx::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
            _ => StoreError::Db(e),
        }
    }
}

/// Offset pagination, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub limit: i64,
}

impl Page {
    /// Clamp caller input into a valid page.
    pub fn new(skip: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            skip: skip.unwrap_or(0).max(0),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by email, ignoring case.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Look up a user by id. Unknown or malformed ids yield `None`.
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    /// Insert atomically, failing with [`StoreError::Duplicate`] if the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Users ordered by creation time, newest first.
    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError>;
}
