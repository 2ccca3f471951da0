//! API integration tests
//!
//! Run the full router in-process against an in-memory SQLite database.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tower::ServiceExt;

use libris_server::{api, config::AppConfig, repository::Repository, services::Services, AppState};

/// Build the application over a fresh in-memory database.
/// A single pooled connection keeps every request on the same database.
async fn test_app() -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let config = AppConfig::default();
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.loans.clone());

    api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

/// Build the application over a file-backed database with several
/// pooled connections, so concurrent requests genuinely interleave
/// instead of serializing on a single connection. Returns the database
/// path for cleanup.
async fn test_app_multi_conn(name: &str) -> (Router, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("{}-{}.db", name, std::process::id()));
    let _ = std::fs::remove_file(&path);

    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .busy_timeout(std::time::Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await
        .expect("Failed to open test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let config = AppConfig::default();
    let repository = Repository::new(pool);
    let services = Services::new(repository, config.loans.clone());

    let app = api::create_router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    });
    (app, path)
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("invalid JSON body")
    };
    (status, body)
}

/// Create a book with a fresh author and return its id
async fn seed_book(app: &Router, title: &str, author: &str) -> i64 {
    let (status, body) = send(
        app,
        request("POST", "/api/books", Some(json!({ "title": title, "author": author }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().expect("book id")
}

#[tokio::test]
async fn health_check_reports_healthy() {
    let app = test_app().await;
    let (status, body) = send(&app, request("GET", "/api/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn author_find_or_create_is_case_insensitive() {
    let app = test_app().await;

    let (status, first) = send(
        &app,
        request("POST", "/api/authors", Some(json!({ "name": "Jane Austen" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = send(
        &app,
        request("POST", "/api/authors", Some(json!({ "name": "jane austen" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["id"], second["id"]);

    let (status, authors) = send(&app, request("GET", "/api/authors", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(authors.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn author_requires_a_name() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        request("POST", "/api/authors", Some(json!({ "name": "" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn book_created_with_author_name_is_available() {
    let app = test_app().await;

    let (status, book) = send(
        &app,
        request(
            "POST",
            "/api/books",
            Some(json!({
                "title": "Persuasion",
                "author": "Jane Austen",
                "isbn": "9780141439686",
                "publication_year": 1817,
                "pages": 249
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(book["author_name"], "Jane Austen");
    assert_eq!(book["available"], true);

    let (status, books) = send(&app, request("GET", "/api/books", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books.as_array().unwrap().len(), 1);
    assert_eq!(books[0]["author_name"], "Jane Austen");
}

#[tokio::test]
async fn book_rejects_unknown_author_id_and_missing_author() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/books",
            Some(json!({ "title": "Orphan", "author_id": 999 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("999"));

    let (status, _) = send(
        &app,
        request("POST", "/api/books", Some(json!({ "title": "No Author" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_isbn_conflicts() {
    let app = test_app().await;

    let payload = json!({ "title": "Emma", "author": "Jane Austen", "isbn": "9780141439587" });
    let (status, _) = send(&app, request("POST", "/api/books", Some(payload.clone()))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, request("POST", "/api/books", Some(payload))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("ISBN"));
}

#[tokio::test]
async fn borrow_and_return_lifecycle() {
    let app = test_app().await;
    let book_id = seed_book(&app, "Persuasion", "Jane Austen").await;

    // Borrow flips availability and computes the due date
    let (status, loan) = send(
        &app,
        request(
            "POST",
            "/api/loans",
            Some(json!({
                "book_id": book_id,
                "borrower": { "name": "Alice", "email": "a@x.com" },
                "days_to_return": 14
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "active");
    assert_eq!(loan["book_title"], "Persuasion");
    assert_eq!(loan["borrower_name"], "Alice");
    assert!(loan["return_date"].is_null());

    let loan_date: chrono::NaiveDate = loan["loan_date"].as_str().unwrap().parse().unwrap();
    let due_date: chrono::NaiveDate = loan["due_date"].as_str().unwrap().parse().unwrap();
    assert_eq!(due_date - loan_date, chrono::Duration::days(14));

    let (_, book) = send(&app, request("GET", &format!("/api/books/{}", book_id), None)).await;
    assert_eq!(book["available"], false);

    // Second borrow before return conflicts
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/loans",
            Some(json!({
                "book_id": book_id,
                "borrower": { "name": "Bob", "email": "b@x.com" }
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("not available"));

    // Return closes the loan and restores availability
    let loan_id = loan["id"].as_i64().unwrap();
    let (status, returned) = send(
        &app,
        request("PUT", &format!("/api/loans/{}/return", loan_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "returned");
    assert!(returned["return_date"].is_string());

    let (_, book) = send(&app, request("GET", &format!("/api/books/{}", book_id), None)).await;
    assert_eq!(book["available"], true);

    // Returning twice conflicts
    let (status, body) = send(
        &app,
        request("PUT", &format!("/api/loans/{}/return", loan_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already returned"));
}

#[tokio::test]
async fn borrow_validates_loan_period() {
    let app = test_app().await;
    let book_id = seed_book(&app, "Emma", "Jane Austen").await;

    for days in [0, -3, 9999] {
        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/loans",
                Some(json!({
                    "book_id": book_id,
                    "borrower": { "name": "Alice", "email": "a@x.com" },
                    "days_to_return": days
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "days_to_return={}", days);
        assert!(body["error"].is_string());
    }

    // Nothing was created and the book stayed available
    let (_, book) = send(&app, request("GET", &format!("/api/books/{}", book_id), None)).await;
    assert_eq!(book["available"], true);
    let (_, loans) = send(&app, request("GET", "/api/loans", None)).await;
    assert!(loans.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn borrow_unknown_book_or_borrower_is_not_found() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/loans",
            Some(json!({
                "book_id": 42,
                "borrower": { "name": "Alice", "email": "a@x.com" }
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let book_id = seed_book(&app, "Emma", "Jane Austen").await;
    let (status, _) = send(
        &app,
        request(
            "POST",
            "/api/loans",
            Some(json!({ "book_id": book_id, "borrower_id": 42 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn borrower_is_reused_by_email() {
    let app = test_app().await;
    let first = seed_book(&app, "Emma", "Jane Austen").await;
    let second = seed_book(&app, "Persuasion", "Jane Austen").await;

    for book_id in [first, second] {
        let (status, _) = send(
            &app,
            request(
                "POST",
                "/api/loans",
                Some(json!({
                    "book_id": book_id,
                    "borrower": { "name": "Alice", "email": "a@x.com" }
                })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, borrowers) = send(&app, request("GET", "/api/borrowers", None)).await;
    assert_eq!(borrowers.as_array().unwrap().len(), 1);

    let (_, loans) = send(&app, request("GET", "/api/loans", None)).await;
    let loans = loans.as_array().unwrap();
    assert_eq!(loans.len(), 2);
    assert_eq!(loans[0]["borrower_id"], loans[1]["borrower_id"]);
}

#[tokio::test]
async fn active_loans_filter() {
    let app = test_app().await;
    let first = seed_book(&app, "Emma", "Jane Austen").await;
    let second = seed_book(&app, "Persuasion", "Jane Austen").await;

    let mut loan_ids = Vec::new();
    for book_id in [first, second] {
        let (_, loan) = send(
            &app,
            request(
                "POST",
                "/api/loans",
                Some(json!({
                    "book_id": book_id,
                    "borrower": { "name": "Alice", "email": "a@x.com" }
                })),
            ),
        )
        .await;
        loan_ids.push(loan["id"].as_i64().unwrap());
    }

    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/loans/{}/return", loan_ids[0]), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, all) = send(&app, request("GET", "/api/loans", None)).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (_, active) = send(&app, request("GET", "/api/loans/active", None)).await;
    let active = active.as_array().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"].as_i64().unwrap(), loan_ids[1]);
}

#[tokio::test]
async fn book_with_any_loan_history_cannot_be_deleted() {
    let app = test_app().await;
    let book_id = seed_book(&app, "Emma", "Jane Austen").await;

    let (_, loan) = send(
        &app,
        request(
            "POST",
            "/api/loans",
            Some(json!({
                "book_id": book_id,
                "borrower": { "name": "Alice", "email": "a@x.com" }
            })),
        ),
    )
    .await;
    let loan_id = loan["id"].as_i64().unwrap();

    // Even a returned loan keeps the book in the ledger
    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/loans/{}/return", loan_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/api/books/{}", book_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("loan history"));

    // A book with no loans deletes cleanly
    let other = seed_book(&app, "Persuasion", "Jane Austen").await;
    let (status, _) = send(&app, request("DELETE", &format!("/api/books/{}", other), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, request("GET", &format!("/api/books/{}", other), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn author_referenced_by_book_cannot_be_deleted() {
    let app = test_app().await;
    seed_book(&app, "Emma", "Jane Austen").await;

    let (_, authors) = send(&app, request("GET", "/api/authors", None)).await;
    let author_id = authors[0]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/authors/{}", author_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn author_without_books_deletes_cleanly() {
    let app = test_app().await;

    let (status, author) = send(
        &app,
        request("POST", "/api/authors", Some(json!({ "name": "Emily Bronte" }))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let author_id = author["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/authors/{}", author_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/authors/{}", author_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn author_rename_collision_conflicts() {
    let app = test_app().await;

    let (_, _) = send(
        &app,
        request("POST", "/api/authors", Some(json!({ "name": "Jane Austen" }))),
    )
    .await;
    let (_, second) = send(
        &app,
        request("POST", "/api/authors", Some(json!({ "name": "Emily Bronte" }))),
    )
    .await;
    let second_id = second["id"].as_i64().unwrap();

    // Renaming onto a taken name conflicts, case-insensitively
    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/authors/{}", second_id),
            Some(json!({ "name": "jane austen" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already exists"));

    // A fresh name goes through
    let (status, renamed) = send(
        &app,
        request(
            "PUT",
            &format!("/api/authors/{}", second_id),
            Some(json!({ "name": "Charlotte Bronte" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "Charlotte Bronte");
}

#[tokio::test]
async fn borrower_update_rejects_taken_email() {
    let app = test_app().await;

    let (_, _) = send(
        &app,
        request(
            "POST",
            "/api/borrowers",
            Some(json!({ "name": "Alice", "email": "a@x.com" })),
        ),
    )
    .await;
    let (_, bob) = send(
        &app,
        request(
            "POST",
            "/api/borrowers",
            Some(json!({ "name": "Bob", "email": "b@x.com" })),
        ),
    )
    .await;
    let bob_id = bob["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        request(
            "PUT",
            &format!("/api/borrowers/{}", bob_id),
            Some(json!({ "email": "a@x.com" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("email"));

    // Updating other fields leaves the email alone
    let (status, updated) = send(
        &app,
        request(
            "PUT",
            &format!("/api/borrowers/{}", bob_id),
            Some(json!({ "phone": "555-0199" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["email"], "b@x.com");
    assert_eq!(updated["phone"], "555-0199");
}

#[tokio::test]
async fn borrower_with_loan_history_cannot_be_deleted() {
    let app = test_app().await;
    let book_id = seed_book(&app, "Emma", "Jane Austen").await;

    let (_, loan) = send(
        &app,
        request(
            "POST",
            "/api/loans",
            Some(json!({
                "book_id": book_id,
                "borrower": { "name": "Alice", "email": "a@x.com" }
            })),
        ),
    )
    .await;
    let borrower_id = loan["borrower_id"].as_i64().unwrap();
    let loan_id = loan["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/api/borrowers/{}", borrower_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("loan history"));

    // Even after the loan is returned the ledger keeps the reference
    let (status, _) = send(
        &app,
        request("PUT", &format!("/api/loans/{}/return", loan_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/borrowers/{}", borrower_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // A borrower with no loans deletes cleanly
    let (_, idle) = send(
        &app,
        request(
            "POST",
            "/api/borrowers",
            Some(json!({ "name": "Bob", "email": "b@x.com" })),
        ),
    )
    .await;
    let idle_id = idle["id"].as_i64().unwrap();
    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/borrowers/{}", idle_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(
        &app,
        request("GET", &format!("/api/borrowers/{}", idle_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_borrows_create_exactly_one_loan() {
    let (app, db_path) = test_app_multi_conn("libris-concurrent-borrows").await;
    let book_id = seed_book(&app, "Emma", "Jane Austen").await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let req = request(
                "POST",
                "/api/loans",
                Some(json!({
                    "book_id": book_id,
                    "borrower": { "name": format!("Reader {}", i), "email": format!("r{}@x.com", i) }
                })),
            );
            let response = app.oneshot(req).await.expect("request failed");
            response.status()
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.expect("task panicked") {
            StatusCode::CREATED => created += 1,
            StatusCode::CONFLICT => conflicts += 1,
            other => panic!("unexpected status {}", other),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);

    let (_, loans) = send(&app, request("GET", "/api/loans", None)).await;
    assert_eq!(loans.as_array().unwrap().len(), 1);

    let (_, book) = send(&app, request("GET", &format!("/api/books/{}", book_id), None)).await;
    assert_eq!(book["available"], false);

    let _ = std::fs::remove_file(db_path);
}
