//! Category endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::category::{Category, CategoryPayload},
    services::catalog::UpdateMode,
    AppState,
};

use super::{AuthenticatedUser, Payload};

/// List all categories
#[utoipa::path(
    get,
    path = "/api/categories/",
    tag = "categories",
    responses(
        (status = 200, description = "Category list", body = Vec<Category>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(categories))
}

/// Get category by ID
#[utoipa::path(
    get,
    path = "/api/categories/{id}/",
    tag = "categories",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category details", body = Category),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Category>> {
    let category = state.services.catalog.get_category(id).await?;
    Ok(Json(category))
}

/// Create category
#[utoipa::path(
    post,
    path = "/api/categories/",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid input or name already used"),
        (status = 403, description = "Not authenticated")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Payload(payload): Payload<CategoryPayload>,
) -> AppResult<(StatusCode, Json<Category>)> {
    let category = state.services.catalog.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Replace category
#[utoipa::path(
    put,
    path = "/api/categories/{id}/",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Category updated", body = Category)
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Payload(payload): Payload<CategoryPayload>,
) -> AppResult<Json<Category>> {
    let category = state
        .services
        .catalog
        .update_category(id, payload, UpdateMode::Full)
        .await?;
    Ok(Json(category))
}

/// Update some fields of a category
#[utoipa::path(
    patch,
    path = "/api/categories/{id}/",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Category updated", body = Category)
    )
)]
pub async fn partial_update_category(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Payload(payload): Payload<CategoryPayload>,
) -> AppResult<Json<Category>> {
    let category = state
        .services
        .catalog
        .update_category(id, payload, UpdateMode::Partial)
        .await?;
    Ok(Json(category))
}

/// Delete category and, with it, all of its books
#[utoipa::path(
    delete,
    path = "/api/categories/{id}/",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
