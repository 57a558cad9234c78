//! Router tests over the in-memory store

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use library_server::{
    api,
    config::AppConfig,
    repository::MemoryStore,
    services::{clock::SystemClock, Services},
    AppState,
};

fn app() -> Router {
    let config = AppConfig::default();
    let services = Services::new(
        Arc::new(MemoryStore::new()),
        Arc::new(SystemClock),
        &config.loans,
    );
    api::router(AppState {
        services: Arc::new(services),
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(format!("/api/v1{}", uri));
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_book(app: &Router, isbn: &str, copies: i32) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/books",
        Some(json!({ "title": "Dune", "isbn": isbn, "totalCopies": copies })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

async fn create_user(app: &Router, email: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/users",
        Some(json!({ "email": email, "fullName": "Ada Reader" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_book_starts_fully_available() {
    let app = app();
    let id = create_book(&app, "9780441013593", 3).await;

    let (status, body) = send(&app, Method::GET, &format!("/books/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCopies"], 3);
    assert_eq!(body["availableCopies"], 3);
    assert_eq!(body["authorIds"], json!([]));
}

#[tokio::test]
async fn test_invalid_book_is_rejected() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/books",
        Some(json!({ "title": "Dune", "isbn": "123", "totalCopies": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_loan_lifecycle() {
    let app = app();
    let book_id = create_book(&app, "9780441013593", 1).await;
    let user_id = create_user(&app, "ada@example.org").await;
    let other_id = create_user(&app, "bob@example.org").await;

    let (status, loan) = send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({ "userId": user_id, "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(loan["returnDate"].is_null());
    let loan_id = loan["id"].as_i64().unwrap();

    // the only copy is out
    let (status, body) = send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({ "userId": other_id, "bookId": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "NotAvailable");

    let (status, returned) =
        send(&app, Method::PUT, &format!("/loans/{}/return", loan_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(returned["returnDate"].is_string());

    let (status, body) =
        send(&app, Method::PUT, &format!("/loans/{}/return", loan_id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidState");

    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book_id), None).await;
    assert_eq!(book["availableCopies"], 1);

    let (status, loans) = send(&app, Method::GET, &format!("/users/{}/loans", user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loans.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_records_are_not_found() {
    let app = app();
    for uri in ["/books/7", "/authors/7", "/users/7", "/profiles/7", "/loans/7"] {
        let (status, body) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["error"], "NotFound");
    }

    let (status, _) = send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({ "userId": 1, "bookId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_one_profile_per_user() {
    let app = app();
    let user_id = create_user(&app, "ada@example.org").await;
    let profile = json!({ "address": "1 Library Lane", "phone": "555-0100" });

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/users/{}/profile", user_id),
        Some(profile.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["userId"], user_id);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/users/{}/profile", user_id),
        Some(profile),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_author_links() {
    let app = app();
    let book_id = create_book(&app, "9780441013593", 1).await;
    let (status, author) = send(
        &app,
        Method::POST,
        "/authors",
        Some(json!({ "name": "Frank Herbert" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let author_id = author["id"].as_i64().unwrap();

    let uri = format!("/books/{}/authors/{}", book_id, author_id);
    let (status, book) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["authorIds"], json!([author_id]));

    let (status, book) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(book["authorIds"], json!([]));

    let (status, _) = send(&app, Method::DELETE, &format!("/authors/{}", author_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_user_frees_copies() {
    let app = app();
    let book_id = create_book(&app, "9780441013593", 1).await;
    let user_id = create_user(&app, "ada@example.org").await;
    send(
        &app,
        Method::POST,
        "/loans",
        Some(json!({ "userId": user_id, "bookId": book_id })),
    )
    .await;

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", user_id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, book) = send(&app, Method::GET, &format!("/books/{}", book_id), None).await;
    assert_eq!(book["availableCopies"], 1);
    let (_, loans) = send(&app, Method::GET, "/loans", None).await;
    assert_eq!(loans, json!([]));
}
