//! Authentication service: register / login flows over an injected store.

use std::sync::Arc;

use tracing::{debug, error, info};

use super::{AuthError, PasswordHasher, TokenIssuer};
use crate::models::{NewUser, Profile, Role, TokenClaims, User};
use crate::store::{Page, StoreError, UserStore};

/// Registration input. Absent and blank fields are treated alike.
#[derive(Clone, Default)]
pub struct Registration {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Login input.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// A freshly issued token and the claims it carries.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: TokenClaims,
}

/// Plaintext behind the hash compared against when a login names no user.
const DECOY_PASSWORD: &str = "tollgate-decoy-password";

/// Orchestrates user lookup, password hashing and token issuance.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    /// Hashed with the live parameters so unknown-email logins cost the same
    /// as wrong-password ones.
    decoy_hash: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
    ) -> Result<Self, AuthError> {
        let decoy_hash = hasher.hash(DECOY_PASSWORD)?;
        Ok(Self {
            store,
            hasher,
            issuer,
            decoy_hash,
        })
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Create an account and return a token for it.
    pub async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        let email = non_blank(registration.email)
            .ok_or_else(|| AuthError::Validation("You must enter an email address.".into()))?;
        let (first_name, last_name) =
            match (non_blank(registration.first_name), non_blank(registration.last_name)) {
                (Some(first), Some(last)) => (first, last),
                _ => {
                    return Err(AuthError::Validation(
                        "You must enter your full name.".into(),
                    ));
                }
            };
        let password = registration
            .password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuthError::Validation("You must enter a password.".into()))?;

        if self.store.find_by_email(&email).await.map_err(store_failure)?.is_some() {
            debug!(email = %email, "registration rejected: email in use");
            return Err(AuthError::Conflict);
        }

        let password_hash = self.hasher.hash_blocking(password).await?;

        let saved = self
            .store
            .insert(NewUser {
                email,
                password_hash,
                profile: Profile {
                    first_name,
                    last_name,
                },
                role: Role::Member,
            })
            .await
            .map_err(store_failure)?;

        info!(user_id = %saved.id, "user registered");
        self.session_for(&saved)
    }

    /// Verify credentials and return a token.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, credentials: Credentials) -> Result<AuthSession, AuthError> {
        let Some(user) = self
            .store
            .find_by_email(&credentials.email)
            .await
            .map_err(store_failure)?
        else {
            let _ = self
                .hasher
                .compare_blocking(credentials.password, self.decoy_hash.clone())
                .await;
            debug!(email = %credentials.email, "login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let matched = self
            .hasher
            .compare_blocking(credentials.password, user.password_hash.clone())
            .await
            .inspect_err(|e| error!(user_id = %user.id, error = %e, "password compare failed"))?;
        if !matched {
            debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        info!(user_id = %user.id, "login succeeded");
        self.session_for(&user)
    }

    /// Resolve a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.issuer.verify(token)?;
        self.store
            .find_by_id(&claims.id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| {
                debug!(user_id = %claims.id, "token refers to unknown user");
                AuthError::InvalidToken
            })
    }

    pub async fn get_user(&self, id: &str) -> Result<User, AuthError> {
        self.store
            .find_by_id(id)
            .await
            .map_err(store_failure)?
            .ok_or(AuthError::NotFound)
    }

    pub async fn list_users(&self, page: Page) -> Result<Vec<User>, AuthError> {
        self.store.list(page).await.map_err(store_failure)
    }

    fn session_for(&self, user: &User) -> Result<AuthSession, AuthError> {
        let claims = user.claims();
        let token = self.issuer.issue(&claims)?;
        Ok(AuthSession {
            token,
            user: claims,
        })
    }
}

/// Log infrastructure failures server-side before they are wrapped.
fn store_failure(e: StoreError) -> AuthError {
    if !matches!(e, StoreError::Duplicate) {
        error!(error = %e, "user store failure");
    }
    AuthError::from(e)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::auth::INVALID_CREDENTIALS_MESSAGE;
    use crate::auth::password::HashParams;
    use crate::store::MemoryUserStore;

    const SECRET: &[u8] = b"service-test-secret";

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(HashParams {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap()
    }

    fn service_with(store: Arc<dyn UserStore>) -> AuthService {
        AuthService::new(store, hasher(), TokenIssuer::new(SECRET, 10080).unwrap()).unwrap()
    }

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            email: Some(email.into()),
            password: Some(password.into()),
            first_name: Some("A".into()),
            last_name: Some("B".into()),
        }
    }

    fn credentials(email: &str, password: &str) -> Credentials {
        Credentials {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Delegates to a memory store but never sees existing users on lookup,
    /// so only the insert-time uniqueness check can catch duplicates.
    struct BlindLookupStore {
        inner: MemoryUserStore,
    }

    #[async_trait]
    impl UserStore for BlindLookupStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }
        async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
            self.inner.find_by_id(id).await
        }
        async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
            self.inner.insert(user).await
        }
        async fn list(&self, page: Page) -> Result<Vec<User>, StoreError> {
            self.inner.list(page).await
        }
    }

    /// Fails every insert and counts attempts.
    #[derive(Default)]
    struct FailingInsertStore {
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl UserStore for FailingInsertStore {
        async fn find_by_email(&self, _email: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }
        async fn find_by_id(&self, _id: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }
        async fn insert(&self, _user: NewUser) -> Result<User, StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Backend("disk full".into()))
        }
        async fn list(&self, _page: Page) -> Result<Vec<User>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn register_returns_member_token_for_input_email() {
        let service = service_with(Arc::new(MemoryUserStore::new()));
        let session = service.register(registration("a@x.com", "pw1")).await.unwrap();

        assert_eq!(session.user.email, "a@x.com");
        assert_eq!(session.user.role, Role::Member);
        assert_eq!(session.user.first_name, "A");
        assert_eq!(service.issuer().verify(&session.token).unwrap(), session.user);
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(store.clone());
        let session = service.register(registration("a@x.com", "pw1")).await.unwrap();

        let saved = store.find_by_id(&session.user.id).await.unwrap().unwrap();
        assert_ne!(saved.password_hash, "pw1");
        assert!(saved.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn register_validates_fields_in_order() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(store.clone());

        let cases = [
            (
                Registration {
                    email: None,
                    ..registration("a@x.com", "")
                },
                "You must enter an email address.",
            ),
            (
                Registration {
                    last_name: Some("  ".into()),
                    ..registration("a@x.com", "pw")
                },
                "You must enter your full name.",
            ),
            (
                Registration {
                    password: None,
                    ..registration("a@x.com", "pw")
                },
                "You must enter a password.",
            ),
            (registration("a@x.com", ""), "You must enter a password."),
        ];

        for (input, expected) in cases {
            match service.register(input).await {
                Err(AuthError::Validation(msg)) => assert_eq!(msg, expected),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn register_twice_conflicts_ignoring_case() {
        let store = Arc::new(MemoryUserStore::new());
        let service = service_with(store.clone());
        service.register(registration("a@x.com", "pw1")).await.unwrap();

        let err = service
            .register(registration("A@X.com", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
        assert_eq!(err.to_string(), "That email address is already in use.");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_registrations_yield_one_success() {
        let store = Arc::new(MemoryUserStore::new());
        let service = Arc::new(service_with(store.clone()));

        let a = tokio::spawn({
            let service = service.clone();
            async move { service.register(registration("race@x.com", "pw1")).await }
        });
        let b = tokio::spawn({
            let service = service.clone();
            async move { service.register(registration("RACE@x.com", "pw2")).await }
        });
        let results = [a.await.unwrap(), b.await.unwrap()];

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AuthError::Conflict)))
            .count();
        assert_eq!((ok, conflicts), (1, 1));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn insert_time_duplicate_maps_to_conflict() {
        let service = service_with(Arc::new(BlindLookupStore {
            inner: MemoryUserStore::new(),
        }));
        service.register(registration("a@x.com", "pw1")).await.unwrap();

        let err = service
            .register(registration("a@x.com", "pw1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn insert_failure_is_propagated() {
        let store = Arc::new(FailingInsertStore::default());
        let service = service_with(store.clone());

        let err = service
            .register(registration("a@x.com", "pw1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(StoreError::Backend(_))));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn login_with_correct_password_issues_token() {
        let service = service_with(Arc::new(MemoryUserStore::new()));
        let registered = service.register(registration("a@x.com", "pw1")).await.unwrap();

        let session = service.login(credentials("A@x.com", "pw1")).await.unwrap();
        assert_eq!(session.user, registered.user);
        assert!(service.issuer().verify(&session.token).is_ok());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let service = service_with(Arc::new(MemoryUserStore::new()));
        service.register(registration("a@x.com", "pw1")).await.unwrap();

        let wrong_password = service
            .login(credentials("a@x.com", "wrong"))
            .await
            .unwrap_err();
        let unknown_email = service
            .login(credentials("nobody@x.com", "pw1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS_MESSAGE);
    }

    #[tokio::test]
    async fn unknown_email_is_checked_against_live_parameters() {
        let service = service_with(Arc::new(MemoryUserStore::new()));

        assert!(service.decoy_hash.starts_with("$argon2id$v=19$m=8,t=1,p=1$"));
        assert!(service.hasher.compare(DECOY_PASSWORD, &service.decoy_hash).unwrap());
        assert!(matches!(
            service.login(credentials("nobody@x.com", DECOY_PASSWORD)).await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn login_with_corrupt_hash_is_internal_error() {
        let store = Arc::new(MemoryUserStore::new());
        store
            .insert(NewUser {
                email: "a@x.com".into(),
                password_hash: "garbage".into(),
                profile: Profile {
                    first_name: "A".into(),
                    last_name: "B".into(),
                },
                role: Role::Member,
            })
            .await
            .unwrap();
        let service = service_with(store);

        let err = service.login(credentials("a@x.com", "pw1")).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[tokio::test]
    async fn login_accepts_legacy_bcrypt_hash() {
        let store = Arc::new(MemoryUserStore::new());
        store
            .insert(NewUser {
                email: "old@x.com".into(),
                password_hash: bcrypt::hash("legacy-pw", 4).unwrap(),
                profile: Profile {
                    first_name: "Old".into(),
                    last_name: "Timer".into(),
                },
                role: Role::Owner,
            })
            .await
            .unwrap();
        let service = service_with(store);

        let session = service.login(credentials("old@x.com", "legacy-pw")).await.unwrap();
        assert_eq!(session.user.role, Role::Owner);
    }

    #[tokio::test]
    async fn authenticate_resolves_token_to_user() {
        let service = service_with(Arc::new(MemoryUserStore::new()));
        let session = service.register(registration("a@x.com", "pw1")).await.unwrap();

        let user = service.authenticate(&session.token).await.unwrap();
        assert_eq!(user.id, session.user.id);
        assert!(matches!(
            service.authenticate("garbage").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn authenticate_rejects_token_for_unknown_user() {
        let other = service_with(Arc::new(MemoryUserStore::new()));
        let session = other.register(registration("a@x.com", "pw1")).await.unwrap();

        let service = service_with(Arc::new(MemoryUserStore::new()));
        assert!(matches!(
            service.authenticate(&session.token).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn get_user_and_list_users() {
        let service = service_with(Arc::new(MemoryUserStore::new()));
        let first = service.register(registration("a@x.com", "pw1")).await.unwrap();
        let second = service.register(registration("b@x.com", "pw2")).await.unwrap();

        let user = service.get_user(&first.user.id).await.unwrap();
        assert_eq!(user.email, "a@x.com");
        assert!(matches!(
            service.get_user("missing").await,
            Err(AuthError::NotFound)
        ));

        let listed = service.list_users(Page::default()).await.unwrap();
        let ids: Vec<_> = listed.iter().map(|u| u.id.clone()).collect();
        assert_eq!(ids, [second.user.id, first.user.id]);
    }
}
