//! API handlers for Libris REST endpoints

pub mod authors;
pub mod books;
pub mod borrowers;
pub mod health;
pub mod loans;
pub mod openapi;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration: the UI is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Books (catalog)
        .route("/books", get(books::list_books))
        .route("/books", post(books::create_book))
        .route("/books/:id", get(books::get_book))
        .route("/books/:id", put(books::update_book))
        .route("/books/:id", delete(books::delete_book))
        // Authors
        .route("/authors", get(authors::list_authors))
        .route("/authors", post(authors::create_author))
        .route("/authors/:id", get(authors::get_author))
        .route("/authors/:id", put(authors::update_author))
        .route("/authors/:id", delete(authors::delete_author))
        // Borrowers
        .route("/borrowers", get(borrowers::list_borrowers))
        .route("/borrowers", post(borrowers::create_borrower))
        .route("/borrowers/:id", get(borrowers::get_borrower))
        .route("/borrowers/:id", put(borrowers::update_borrower))
        .route("/borrowers/:id", delete(borrowers::delete_borrower))
        // Loans
        .route("/loans", get(loans::list_loans))
        .route("/loans", post(loans::create_loan))
        .route("/loans/active", get(loans::list_active_loans))
        .route("/loans/:id/return", put(loans::return_loan))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api", api)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
