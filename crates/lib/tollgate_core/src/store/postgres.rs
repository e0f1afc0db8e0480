//! PostgreSQL user store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Page, StoreError, UserStore};
use crate::models::user::normalize_email;
use crate::models::{NewUser, Profile, User};

const USER_COLUMNS: &str = "id::text, email, password_hash, first_name, last_name, role, \
     reset_password_token, reset_password_expires, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    reset_password_token: Option<String>,
    reset_password_expires: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| StoreError::Backend(format!("user {}: {e}", row.id)))?;
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            profile: Profile {
                first_name: row.first_name,
                last_name: row.last_name,
            },
            role,
            reset_password_token: row.reset_password_token,
            reset_password_expires: row.reset_password_expires,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// [`UserStore`] over a sqlx connection pool.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let Ok(id) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(User::try_from).transpose()
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, role) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(normalize_email(&user.email))
        .bind(&user.password_hash)
        .bind(&user.profile.first_name)
        .bind(&user.profile.last_name)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;
        User::try_from(row)
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             ORDER BY created_at DESC, id DESC \
             OFFSET $1 LIMIT $2"
        ))
        .bind(page.skip)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(User::try_from).collect()
    }
}
