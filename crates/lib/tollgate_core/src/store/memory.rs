//! In-process user store backed by `DashMap`.
//!
//! Used for tests and `--store memory` development runs. Contents are lost on
//! restart.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{Page, StoreError, UserStore};
use crate::models::user::normalize_email;
use crate::models::{NewUser, User};
use crate::uuid::uuidv7;

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    /// id → user
    users: DashMap<String, User>,
    /// lowercase email → id
    emails: DashMap<String, String>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.emails.get(&normalize_email(email)).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|r| r.value().clone()))
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        match self.emails.entry(normalize_email(&user.email)) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let saved = User {
                    id: uuidv7().to_string(),
                    email: slot.key().clone(),
                    password_hash: user.password_hash,
                    profile: user.profile,
                    role: user.role,
                    reset_password_token: None,
                    reset_password_expires: None,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(saved.id.clone(), saved.clone());
                slot.insert(saved.id.clone());
                Ok(saved)
            }
        }
    }

    async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
        let mut all: Vec<User> = self.users.iter().map(|r| r.value().clone()).collect();
        // uuidv7 ids break ties between users created in the same instant
        all.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(all
            .into_iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .collect())
    }
}
