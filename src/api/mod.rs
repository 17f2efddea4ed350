//! API handlers for Stacks REST endpoints

pub mod auth;
pub mod books;
pub mod categories;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    error::{AppError, FieldErrors},
    middleware::rate_limit,
    models::user::TokenClaims,
    AppState,
};

/// Extractor for authenticated user from JWT access token
///
/// A missing header is a permission error (403), a bad token an
/// authentication error (401).
pub struct AuthenticatedUser(pub TokenClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AppError::Authorization("Authentication credentials were not provided.".to_string())
            })?;

        // Check for Bearer token
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = state.services.auth.verify_access(token.trim())?;

        Ok(AuthenticatedUser(claims))
    }
}

/// JSON body extractor reporting malformed bodies as a validation error
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| {
                AppError::Validation(FieldErrors::single("non_field_errors", rejection.body_text()))
            })?;
        Ok(Payload(value))
    }
}

/// Register `path` with and without its trailing slash
fn route_both(router: Router<AppState>, path: &str, method_router: MethodRouter<AppState>) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{}/", path), method_router)
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut api = Router::new();
    // Catalog
    api = route_both(api, "/books", get(books::list_books).post(books::create_book));
    api = route_both(
        api,
        "/books/:id",
        get(books::get_book)
            .put(books::update_book)
            .patch(books::partial_update_book)
            .delete(books::delete_book),
    );
    api = route_both(
        api,
        "/categories",
        get(categories::list_categories).post(categories::create_category),
    );
    api = route_both(
        api,
        "/categories/:id",
        get(categories::get_category)
            .put(categories::update_category)
            .patch(categories::partial_update_category)
            .delete(categories::delete_category),
    );
    // Authentication
    api = route_both(api, "/token", post(auth::obtain_token));
    api = route_both(api, "/token/refresh", post(auth::refresh_token));
    api = route_both(api, "/register", post(auth::register));
    // Users
    api = route_both(api, "/users", get(users::list_users));

    let api = api
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::throttle))
        .with_state(state.clone());

    let health = Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(health)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
