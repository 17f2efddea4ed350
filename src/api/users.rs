//! User listing endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::user::UserSummary, AppState};

use super::AuthenticatedUser;

/// List id and username of every account
#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of users", body = Vec<UserSummary>),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Not authenticated")
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<UserSummary>>> {
    let users = state.services.auth.list_users().await?;
    Ok(Json(users))
}
