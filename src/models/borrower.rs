//! Borrower model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Borrower model from database. `email` is the uniqueness key:
/// a borrower is created on first borrow and reused thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrower {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// Create (or find) borrower request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBorrower {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    pub phone: Option<String>,
}

/// Update borrower request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBorrower {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
