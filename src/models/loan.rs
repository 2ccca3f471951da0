//! Loan (borrow) model and related types
//!
//! Loans form an append-only ledger: rows are never deleted, and a loan
//! transitions from `active` to `returned` exactly once.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Loan lifecycle status
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Returned,
}

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub borrower_id: i64,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

/// Loan joined with book title and borrower name
#[derive(Debug, Clone, FromRow)]
pub struct LoanWithRefs {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub borrower_id: i64,
    pub borrower_name: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

/// Loan with full details for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoanDetails {
    pub id: i64,
    pub book_id: i64,
    pub book_title: String,
    pub borrower_id: i64,
    pub borrower_name: String,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
    pub status: LoanStatus,
    pub days_remaining: i64,
    pub is_overdue: bool,
}

/// Create loan request (borrow a book). The caller supplies either an
/// existing `borrower_id` or inline `borrower` fields to be resolved
/// by email (find-or-create).
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLoan {
    pub book_id: i64,
    pub borrower_id: Option<i64>,
    pub borrower: Option<super::borrower::CreateBorrower>,
    pub days_to_return: Option<i64>,
}
