//! User lookup handlers. Both require authentication.

use axum::Json;
use axum::extract::{Path, State};
use tollgate_core::store::Page;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::AppQuery;
use crate::models::{ListUsersQuery, UserView};

/// `GET /api/users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserView>> {
    let user = state.auth.get_user(&id).await?;
    Ok(Json(UserView::from(&user)))
}

/// `GET /api/users?skip=&limit=`, newest first.
pub async fn list_users_handler(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListUsersQuery>,
) -> AppResult<Json<Vec<UserView>>> {
    let users = state
        .auth
        .list_users(Page::new(query.skip, query.limit))
        .await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}
