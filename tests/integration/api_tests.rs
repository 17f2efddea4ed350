//! Live API tests against a running server with an empty database

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api";

/// Unique suffix so tests can share one database
fn unique() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..10].to_string()
}

/// Register a fresh user and return an access token
async fn get_auth_token(client: &Client) -> String {
    let username = format!("reader_{}", unique());
    let response = client
        .post(format!("{}/register/", BASE_URL))
        .json(&json!({ "username": username, "password": "s3cret-pass" }))
        .send()
        .await
        .expect("Failed to send register request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .post(format!("{}/token/", BASE_URL))
        .json(&json!({ "username": username, "password": "s3cret-pass" }))
        .send()
        .await
        .expect("Failed to send token request");

    let body: Value = response.json().await.expect("Failed to parse token response");
    body["access"].as_str().expect("No access token in response").to_string()
}

async fn create_category(client: &Client, token: &str) -> i64 {
    let response = client
        .post(format!("{}/categories/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({ "name": format!("Fiction {}", unique()) }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("category id")
}

async fn create_book(client: &Client, token: &str, category: i64, author: &str) -> Value {
    let isbn = unique();
    let response = client
        .post(format!("{}/books/", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": "The Hobbit",
            "author": author,
            "published_date": "1937-09-21",
            "ISBN": isbn,
            "category": category
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("Failed to parse response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get("http://localhost:8080/health")
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_token_pair_and_refresh() {
    let client = Client::new();
    let username = format!("reader_{}", unique());

    client
        .post(format!("{}/register/", BASE_URL))
        .json(&json!({ "username": username, "password": "pw", "email": "r@example.org" }))
        .send()
        .await
        .expect("Failed to send request");

    let response = client
        .post(format!("{}/token/", BASE_URL))
        .json(&json!({ "username": username, "password": "pw" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let pair: Value = response.json().await.expect("Failed to parse response");
    assert!(pair["access"].is_string());
    let refresh = pair["refresh"].as_str().expect("refresh token");

    let response = client
        .post(format!("{}/token/refresh/", BASE_URL))
        .json(&json!({ "refresh": refresh }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["access"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_wrong_password_is_rejected() {
    let client = Client::new();
    let response = client
        .post(format!("{}/token/", BASE_URL))
        .json(&json!({ "username": "nobody", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_register_duplicate_username() {
    let client = Client::new();
    let username = format!("reader_{}", unique());
    let payload = json!({ "username": username, "password": "pw" });

    let first = client
        .post(format!("{}/register/", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(first.status(), StatusCode::CREATED);
    let body: Value = first.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], username.as_str());
    assert!(body.get("password").is_none());

    let second = client
        .post(format!("{}/register/", BASE_URL))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body: Value = second.json().await.expect("Failed to parse response");
    assert!(body["fields"]["username"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_book_lifecycle() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let category = create_category(&client, &token).await;

    let book = create_book(&client, &token, category, "J.R.R. Tolkien").await;
    let id = book["id"].as_i64().expect("book id");
    assert_eq!(book["category"], category);
    assert_eq!(book["published_date"], "1937-09-21");

    // Anyone can read
    let response = client
        .get(format!("{}/books/{}/", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    // Partial update keeps other fields
    let response = client
        .patch(format!("{}/books/{}/", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "title": "There and Back Again" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["title"], "There and Back Again");
    assert_eq!(updated["ISBN"], book["ISBN"]);

    // Full update without every field fails
    let response = client
        .put(format!("{}/books/{}/", BASE_URL, id))
        .bearer_auth(&token)
        .json(&json!({ "title": "Only a title" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .delete(format!("{}/books/{}/", BASE_URL, id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}/", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_and_unknown_category() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, "Ursula K. Le Guin").await;

    let response = client
        .post(format!("{}/books/", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "A Wizard of Earthsea",
            "author": "Ursula K. Le Guin",
            "published_date": "1968-11-01",
            "ISBN": book["ISBN"],
            "category": 999999
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["fields"]["ISBN"].is_array());
    assert!(body["fields"]["category"].is_array());
}

#[tokio::test]
#[ignore]
async fn test_filter_and_paginate_books() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let category = create_category(&client, &token).await;
    let author = format!("Author {}", unique());
    for _ in 0..7 {
        create_book(&client, &token, category, &author).await;
    }

    let response = client
        .get(format!("{}/books/", BASE_URL))
        .query(&[("author", author.to_lowercase()), ("category", category.to_string())])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(page["count"], 7);
    assert_eq!(page["results"].as_array().map(Vec::len), Some(5));
    assert!(page["previous"].is_null());
    assert!(page["next"].is_number());

    let response = client
        .get(format!("{}/books/", BASE_URL))
        .query(&[("author", author.as_str()), ("page", "2")])
        .send()
        .await
        .expect("Failed to send request");
    let page: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(page["results"].as_array().map(Vec::len), Some(2));
    assert!(page["next"].is_null());

    // Year filter that cannot match
    let response = client
        .get(format!("{}/books/", BASE_URL))
        .query(&[("author", author.as_str()), ("published_year", "1800")])
        .send()
        .await
        .expect("Failed to send request");
    let page: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(page["count"], 0);
}

#[tokio::test]
#[ignore]
async fn test_deleting_category_removes_its_books() {
    let client = Client::new();
    let token = get_auth_token(&client).await;
    let category = create_category(&client, &token).await;
    let book = create_book(&client, &token, category, "Mervyn Peake").await;

    let response = client
        .delete(format!("{}/categories/{}/", BASE_URL, category))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/books/{}/", BASE_URL, book["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_list_users_requires_token() {
    let client = Client::new();

    let response = client
        .get(format!("{}/users/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let token = get_auth_token(&client).await;
    let response = client
        .get(format!("{}/users/", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let users: Value = response.json().await.expect("Failed to parse response");
    let first = &users.as_array().expect("array")[0];
    assert!(first["id"].is_number());
    assert!(first.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_out_of_range_page_is_empty() {
    let client = Client::new();
    let response = client
        .get(format!("{}/books/", BASE_URL))
        .query(&[("author", unique().as_str()), ("page", "999")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    let page: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(page["count"], 0);
    assert_eq!(page["results"], json!([]));
}
