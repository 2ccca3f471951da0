//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Author model from database.
/// `name` is unique case-insensitively: "Jane Austen" and "jane austen"
/// resolve to the same row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i64,
    pub name: String,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Create (or find) author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Update author request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAuthor {
    pub name: Option<String>,
    pub biography: Option<String>,
    pub birth_date: Option<NaiveDate>,
}
