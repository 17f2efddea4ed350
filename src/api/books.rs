//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::book::{Book, BookPayload, BookQuery},
    services::catalog::{BookListing, UpdateMode},
    AppState,
};

use super::{AuthenticatedUser, Payload};

/// List books with filters and pagination
///
/// Returns `{count, next, previous, results}` when pagination is enabled,
/// a plain array otherwise.
#[utoipa::path(
    get,
    path = "/api/books/",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Books matching the filters", body = [Book]),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<BookListing>> {
    tracing::debug!("Fetching book list");
    let listing = state.services.catalog.list_books(&query).await?;
    Ok(Json(listing))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/api/books/{id}/",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/api/books/",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookPayload,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input or ISBN already used"),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Not authenticated")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Payload(payload): Payload<BookPayload>,
) -> AppResult<(StatusCode, Json<Book>)> {
    tracing::debug!("Creating book for user {}", claims.username);
    let created = state.services.catalog.create_book(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Replace an existing book
#[utoipa::path(
    put,
    path = "/api/books/{id}/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Payload(payload): Payload<BookPayload>,
) -> AppResult<Json<Book>> {
    let updated = state
        .services
        .catalog
        .update_book(id, payload, UpdateMode::Full)
        .await?;
    Ok(Json(updated))
}

/// Update some fields of an existing book
#[utoipa::path(
    patch,
    path = "/api/books/{id}/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = BookPayload,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn partial_update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Payload(payload): Payload<BookPayload>,
) -> AppResult<Json<Book>> {
    let updated = state
        .services
        .catalog
        .update_book(id, payload, UpdateMode::Partial)
        .await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/api/books/{id}/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
