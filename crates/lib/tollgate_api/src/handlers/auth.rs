//! Authentication request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use tollgate_core::auth::{Credentials, Registration};

use crate::AppState;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{LoginRequest, MeResponse, RegisterRequest, TokenResponse, UserView};

/// `POST /api/auth/login` — authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let session = state
        .auth
        .login(Credentials {
            email: body.email,
            password: body.password,
        })
        .await?;
    Ok(Json(TokenResponse::new(&session.token, session.user)))
}

/// `POST /api/auth/register` — create a new user account.
pub async fn register_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let session = state
        .auth
        .register(Registration {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(TokenResponse::new(&session.token, session.user)),
    ))
}

/// `GET /api/auth/me` — the user the presented token belongs to.
pub async fn me_handler(
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
) -> Json<MeResponse> {
    Json(MeResponse {
        user: UserView::from(&user),
    })
}
