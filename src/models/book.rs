//! Book (catalog) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Placeholder cover used when no image URL is supplied
pub const DEFAULT_IMAGE_URL: &str = "https://via.placeholder.com/150x200?text=No+Image";

/// Book model joined with its author name.
/// `available` is derived-but-stored: it is true exactly when no active
/// loan references the book, and only the loan workflows flip it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub author_name: String,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub pages: Option<i32>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub available: bool,
}

/// Create book request. The caller supplies either an existing
/// `author_id` or a raw `author` name to be resolved (find-or-create).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    pub author_id: Option<i64>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub pages: Option<i32>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

/// Update book request; absent fields keep their current value
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub author_id: Option<i64>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub pages: Option<i32>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}
