//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, books, categories, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stacks API",
        version = "1.0.0",
        description = "Library catalog REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::partial_update_book,
        books::delete_book,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::partial_update_category,
        categories::delete_category,
        // Auth
        auth::obtain_token,
        auth::refresh_token,
        auth::register,
        // Users
        users::list_users,
    ),
    components(
        schemas(
            crate::models::book::Book,
            crate::models::book::BookPayload,
            crate::models::category::Category,
            crate::models::category::CategoryPayload,
            crate::models::user::UserSummary,
            crate::models::user::RegisterPayload,
            crate::models::user::RegisteredUser,
            crate::models::user::LoginRequest,
            crate::models::user::RefreshRequest,
            crate::models::user::TokenPair,
            crate::models::user::AccessToken,
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::FieldErrors,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "categories", description = "Book categories"),
        (name = "auth", description = "Token issuance and registration"),
        (name = "users", description = "User accounts")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
