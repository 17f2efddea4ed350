//! In-process router tests (no database round-trip)

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use stacks_server::{
    api,
    config::AppConfig,
    models::user::{TokenClaims, TokenType, User},
    AppState,
};

fn app_with(config: AppConfig) -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    api::router(AppState::new(config, pool))
}

fn app() -> Router {
    app_with(AppConfig::default())
}

fn user(id: i32) -> User {
    User {
        id,
        username: format!("reader{}", id),
        email: String::new(),
        password: String::new(),
        date_joined: Utc::now(),
    }
}

fn token(token_type: TokenType, user_id: i32) -> String {
    let secret = AppConfig::default().auth.jwt_secret;
    TokenClaims::new(token_type, &user(user_id), Duration::minutes(5))
        .create_token(&secret)
        .expect("token")
}

fn request(method: Method, uri: &str, bearer: Option<&str>, body: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn test_health_is_served() {
    let response = app()
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_book_without_credentials_is_forbidden() {
    for uri in ["/api/books/", "/api/books"] {
        let response = app()
            .oneshot(request(Method::POST, uri, None, Some("{}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
        let body = json_body(response).await;
        assert_eq!(body["code"], 3);
    }
}

#[tokio::test]
async fn test_write_routes_require_credentials() {
    let cases = [
        (Method::PUT, "/api/books/1/"),
        (Method::PATCH, "/api/books/1/"),
        (Method::DELETE, "/api/books/1/"),
        (Method::POST, "/api/categories/"),
        (Method::DELETE, "/api/categories/1/"),
        (Method::GET, "/api/users/"),
    ];
    for (method, uri) in cases {
        let response = app()
            .oneshot(request(method.clone(), uri, None, Some("{}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let response = app()
        .oneshot(request(Method::POST, "/api/books/", Some("not-a-jwt"), Some("{}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["code"], 2);
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let refresh = token(TokenType::Refresh, 1);
    let response = app()
        .oneshot(request(Method::POST, "/api/categories/", Some(&refresh), Some("{}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let access = token(TokenType::Access, 1);
    let response = app()
        .oneshot(request(Method::POST, "/api/books/", Some(&access), Some("{\"title\": ")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fields"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_missing_book_fields_are_reported() {
    let access = token(TokenType::Access, 1);
    let response = app()
        .oneshot(request(Method::POST, "/api/books/", Some(&access), Some("{}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    for field in ["title", "author", "published_date", "ISBN", "category"] {
        assert_eq!(body["fields"][field][0], "This field is required.", "{}", field);
    }
}

#[tokio::test]
async fn test_blank_category_name_is_reported() {
    let access = token(TokenType::Access, 1);
    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/categories/",
            Some(&access),
            Some(&json!({ "name": "   " }).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["fields"]["name"][0], "This field may not be blank.");
}

#[tokio::test]
async fn test_null_fields_are_reported() {
    let access = token(TokenType::Access, 1);
    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/books/",
            Some(&access),
            Some(
                &json!({
                    "title": null,
                    "author": "Mervyn Peake",
                    "published_date": "1946-01-01",
                    "ISBN": "9780099288688",
                    "category": null
                })
                .to_string(),
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["fields"]["title"][0], "This field may not be null.");
    assert_eq!(body["fields"]["category"][0], "This field may not be null.");
    assert!(body["fields"]["author"].is_null());
}

#[tokio::test]
async fn test_register_rejects_overlong_email() {
    let label = "d".repeat(60);
    let email = format!("{}@{}.{}.{}.{}.com", "l".repeat(64), label, label, label, label);
    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/register/",
            None,
            Some(&json!({ "username": "pippin", "password": "second-breakfast", "email": email }).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["fields"]["email"][0],
        "Ensure this field has no more than 254 characters."
    );
}

#[tokio::test]
async fn test_token_requires_credentials() {
    let response = app()
        .oneshot(request(Method::POST, "/api/token/", None, Some("{}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["fields"]["username"][0], "This field is required.");
    assert_eq!(body["fields"]["password"][0], "This field is required.");
}

#[tokio::test]
async fn test_refresh_issues_access_token() {
    let refresh = token(TokenType::Refresh, 9);
    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/token/refresh/",
            None,
            Some(&json!({ "refresh": refresh }).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let access = body["access"].as_str().expect("access token");

    let claims = TokenClaims::from_token(access, &AppConfig::default().auth.jwt_secret).unwrap();
    assert_eq!(claims.token_type, TokenType::Access);
    assert_eq!(claims.user_id, 9);
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let access = token(TokenType::Access, 9);
    let response = app()
        .oneshot(request(
            Method::POST,
            "/api/token/refresh/",
            None,
            Some(&json!({ "refresh": access }).to_string()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_reports_missing_fields() {
    let response = app()
        .oneshot(request(Method::POST, "/api/register/", None, Some("{}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["fields"]["username"].is_array());
    assert!(body["fields"]["password"].is_array());
}

#[tokio::test]
async fn test_throttle_per_identity() {
    let mut config = AppConfig::default();
    config.rate_limit.requests_per_minute = 2;
    let app = app_with(config);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(request(Method::POST, "/api/books/", None, Some("{}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    let response = app
        .clone()
        .oneshot(request(Method::POST, "/api/books/", None, Some("{}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    let body = json_body(response).await;
    assert_eq!(body["code"], 7);

    // An authenticated caller is counted on its own
    let access = token(TokenType::Access, 3);
    let response = app
        .clone()
        .oneshot(request(Method::POST, "/api/books/", Some(&access), Some("{}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Probes sit outside the limiter
    let response = app
        .oneshot(request(Method::GET, "/health", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
