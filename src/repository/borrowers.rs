//! Borrowers repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, CreateBorrower, UpdateBorrower},
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Sqlite>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// List all borrowers ordered by name
    pub async fn list(&self) -> AppResult<Vec<Borrower>> {
        let borrowers = sqlx::query_as::<_, Borrower>(
            "SELECT id, name, email, phone FROM borrowers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(borrowers)
    }

    /// Get borrower by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>("SELECT id, name, email, phone FROM borrowers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    /// Find borrower by email
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Borrower>> {
        let borrower = sqlx::query_as::<_, Borrower>(
            "SELECT id, name, email, phone FROM borrowers WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(borrower)
    }

    /// Find-or-create a borrower keyed on email, safe under concurrent
    /// callers: insert-if-absent against the unique constraint, then
    /// re-fetch on a lost race. An existing borrower has its name and
    /// phone refreshed from the request. Returns the borrower and
    /// whether a new row was created.
    pub async fn resolve_or_create(&self, borrower: &CreateBorrower) -> AppResult<(Borrower, bool)> {
        let inserted_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO borrowers (name, email, phone)
            VALUES (?, ?, ?)
            ON CONFLICT (email) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&borrower.name)
        .bind(&borrower.email)
        .bind(&borrower.phone)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = inserted_id {
            tracing::info!("Created borrower {} (id={})", borrower.email, id);
            return Ok((self.get_by_id(id).await?, true));
        }

        let existing = self.find_by_email(&borrower.email).await?.ok_or_else(|| {
            AppError::Internal(format!(
                "Borrower {} could not be resolved",
                borrower.email
            ))
        })?;

        // Returning visitor: refresh contact details
        sqlx::query("UPDATE borrowers SET name = ?, phone = COALESCE(?, phone) WHERE id = ?")
            .bind(&borrower.name)
            .bind(&borrower.phone)
            .bind(existing.id)
            .execute(&self.pool)
            .await?;

        Ok((self.get_by_id(existing.id).await?, false))
    }

    /// Update a borrower
    pub async fn update(&self, id: i64, update: &UpdateBorrower) -> AppResult<Borrower> {
        let current = self.get_by_id(id).await?;

        let result = sqlx::query("UPDATE borrowers SET name = ?, email = ?, phone = ? WHERE id = ?")
            .bind(update.name.as_ref().unwrap_or(&current.name))
            .bind(update.email.as_ref().unwrap_or(&current.email))
            .bind(update.phone.as_ref().or(current.phone.as_ref()))
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => self.get_by_id(id).await,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                "A borrower with this email already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a borrower. Refused while the borrower has an active loan;
    /// historical loans keep referencing the row for the ledger, so
    /// deletion is also refused when any loan exists.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let has_loans: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE borrower_id = ?)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if has_loans {
            return Err(AppError::Conflict(
                "Cannot delete borrower with loan history".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM borrowers WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Borrower with id {} not found",
                id
            )));
        }

        tx.commit().await?;
        Ok(())
    }
}
