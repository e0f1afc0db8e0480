//! # tollgate_api
//!
//! HTTP API library for Tollgate.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tollgate_core::auth::{AuthError, AuthService, PasswordHasher, TokenIssuer};
use tollgate_core::store::UserStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{auth, users};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Authentication service over the configured user store.
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Wire the auth service from `config` on top of `store`.
    pub fn new(config: &ApiConfig, store: Arc<dyn UserStore>) -> Result<Self, AuthError> {
        let hasher = PasswordHasher::new(config.hash_params)?;
        let issuer = TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_lifetime_secs)?;
        Ok(Self {
            auth: Arc::new(AuthService::new(store, hasher, issuer)?),
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `tollgate_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tollgate_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .route(routes::GET_USERS, get(users::list_users_handler))
        .route(routes::GET_USERS_ID, get(users::get_user_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
