//! Authentication endpoints: token pair, refresh, registration

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::user::{AccessToken, LoginRequest, RefreshRequest, RegisterPayload, RegisteredUser, TokenPair},
    AppState,
};

use super::Payload;

/// Obtain an access/refresh token pair
#[utoipa::path(
    post,
    path = "/api/token/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 400, description = "Missing credentials"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    Payload(request): Payload<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state.services.auth.login(request).await?;
    Ok(Json(pair))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/token/refresh/",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessToken),
        (status = 401, description = "Token is invalid or expired")
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Payload(request): Payload<RefreshRequest>,
) -> AppResult<Json<AccessToken>> {
    let access = state.services.auth.refresh(request)?;
    Ok(Json(AccessToken { access }))
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/register/",
    tag = "auth",
    request_body = RegisterPayload,
    responses(
        (status = 201, description = "User registered", body = RegisteredUser),
        (status = 400, description = "Invalid input or username already used")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Payload(payload): Payload<RegisterPayload>,
) -> AppResult<(StatusCode, Json<RegisteredUser>)> {
    let user = state.services.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(RegisteredUser::from(user))))
}
