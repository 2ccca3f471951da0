//! Loans repository for database operations
//!
//! The ledger is append-only: loans are inserted by the borrow workflow
//! and transitioned to `returned` by the return workflow, never deleted.

use chrono::NaiveDate;
use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, LoanStatus, LoanWithRefs},
};

const SELECT_LOAN: &str =
    "SELECT id, book_id, borrower_id, loan_date, due_date, return_date, status FROM loans";

const SELECT_LOAN_WITH_REFS: &str = r#"
    SELECT l.id, l.book_id, b.title AS book_title,
           l.borrower_id, w.name AS borrower_name,
           l.loan_date, l.due_date, l.return_date, l.status
    FROM loans l
    JOIN books b ON b.id = l.book_id
    JOIN borrowers w ON w.id = l.borrower_id
"#;

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Sqlite>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>(&format!("{} WHERE id = ?", SELECT_LOAN))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Get loan by ID joined with book title and borrower name
    pub async fn get_details(&self, id: i64) -> AppResult<LoanWithRefs> {
        sqlx::query_as::<_, LoanWithRefs>(&format!("{} WHERE l.id = ?", SELECT_LOAN_WITH_REFS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Full ledger, most recent first
    pub async fn list(&self) -> AppResult<Vec<LoanWithRefs>> {
        let loans = sqlx::query_as::<_, LoanWithRefs>(&format!(
            "{} ORDER BY l.loan_date DESC, l.id DESC",
            SELECT_LOAN_WITH_REFS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Active loans only
    pub async fn list_active(&self) -> AppResult<Vec<LoanWithRefs>> {
        let loans = sqlx::query_as::<_, LoanWithRefs>(&format!(
            "{} WHERE l.status = 'active' ORDER BY l.due_date, l.id",
            SELECT_LOAN_WITH_REFS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Create a loan for a book, atomically with the availability flip.
    ///
    /// The availability check-and-set and the loan insert run in one
    /// transaction. The UPDATE only hits a row when `available = 1`, so
    /// of two concurrent borrows of the same book exactly one claims the
    /// book; the other sees zero rows and fails with Conflict. The
    /// partial unique index on active loans backs this up at the store
    /// level.
    pub async fn create(
        &self,
        book_id: i64,
        borrower_id: i64,
        loan_date: NaiveDate,
        due_date: NaiveDate,
    ) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query("UPDATE books SET available = 0 WHERE id = ? AND available = 1")
            .bind(book_id)
            .execute(&mut *tx)
            .await?;

        if claimed.rows_affected() == 0 {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = ?)")
                .bind(book_id)
                .fetch_one(&mut *tx)
                .await?;

            return if exists {
                Err(AppError::Conflict(
                    "Book is not available for loan".to_string(),
                ))
            } else {
                Err(AppError::NotFound(format!(
                    "Book with id {} not found",
                    book_id
                )))
            };
        }

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (book_id, borrower_id, loan_date, due_date, status)
            VALUES (?, ?, ?, ?, 'active')
            RETURNING id, book_id, borrower_id, loan_date, due_date, return_date, status
            "#,
        )
        .bind(book_id)
        .bind(borrower_id)
        .bind(loan_date)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            // The partial unique index on active loans; unreachable while
            // the availability flag is consistent.
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("Book is not available for loan".to_string())
            }
            e => e.into(),
        })?;

        tx.commit().await?;

        tracing::info!(
            "Created loan id={} book_id={} borrower_id={} due={}",
            loan.id,
            book_id,
            borrower_id,
            due_date
        );

        Ok(loan)
    }

    /// Close a loan and restore the book's availability.
    ///
    /// The status flip and the availability flip are one transaction; a
    /// crash between them would break the availability invariant.
    pub async fn return_loan(&self, loan_id: i64, return_date: NaiveDate) -> AppResult<Loan> {
        let mut tx = self.pool.begin().await?;

        let loan = sqlx::query_as::<_, Loan>(&format!("{} WHERE id = ?", SELECT_LOAN))
            .bind(loan_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", loan_id)))?;

        if loan.status == LoanStatus::Returned {
            return Err(AppError::Conflict("Book already returned".to_string()));
        }

        let updated = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans SET status = 'returned', return_date = ?
            WHERE id = ? AND status = 'active'
            RETURNING id, book_id, borrower_id, loan_date, due_date, return_date, status
            "#,
        )
        .bind(return_date)
        .bind(loan_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::Conflict("Book already returned".to_string()))?;

        sqlx::query("UPDATE books SET available = 1 WHERE id = ?")
            .bind(updated.book_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Returned loan id={} book_id={}", loan_id, updated.book_id);

        Ok(updated)
    }
}
