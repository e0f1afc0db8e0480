//! Authentication middleware: token extraction and verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tollgate_core::models::User;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;
use crate::models::TOKEN_SCHEME;

/// Key used to store the resolved user in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Pull the raw token out of an `Authorization` header value.
///
/// Accepts the `JWT` scheme handed out by login/register as well as `Bearer`.
pub fn extract_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    let known = scheme.eq_ignore_ascii_case(TOKEN_SCHEME) || scheme.eq_ignore_ascii_case("Bearer");
    (known && !token.is_empty()).then_some(token)
}

/// Axum middleware: verifies the token, loads the user it names, and injects
/// `AuthenticatedUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = extract_token(header).ok_or_else(|| {
        debug!("rejecting request with unsupported authorization scheme");
        AppError::Unauthorized("Invalid authorization scheme".into())
    })?;

    let user = state.auth.authenticate(token).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}
