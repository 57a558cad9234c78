//! API tests against a running server
//!
//! Start the server (the in-memory backend is enough:
//! `LIBRARY_DATABASE__BACKEND=memory`), then run
//! `cargo test -- --ignored`.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// ISBNs must be unique across runs against the same server
fn unique_isbn() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("978{}", nanos % 10_000_000_000)
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_create_and_get_book() {
    let client = Client::new();

    let response = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({
            "title": "The Left Hand of Darkness",
            "isbn": unique_isbn(),
            "totalCopies": 2
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
    let created: Value = response.json().await.expect("Failed to parse response");
    let id = created["id"].as_i64().expect("No id in response");

    let response = client
        .get(format!("{}/books/{}", BASE_URL, id))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["availableCopies"], 2);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return() {
    let client = Client::new();

    let book: Value = client
        .post(format!("{}/books", BASE_URL))
        .json(&json!({ "title": "Kindred", "isbn": unique_isbn(), "totalCopies": 1 }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let user: Value = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "email": format!("reader{}@example.org", unique_isbn()),
            "fullName": "Octavia Reader"
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let response = client
        .post(format!("{}/loans", BASE_URL))
        .json(&json!({ "userId": user["id"], "bookId": book["id"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
    let loan: Value = response.json().await.expect("Failed to parse response");

    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan["id"]))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_unknown_loan() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans/999999999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 404);
}
