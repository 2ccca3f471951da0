//! Borrower management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, CreateBorrower, UpdateBorrower},
    repository::Repository,
};

#[derive(Clone)]
pub struct BorrowersService {
    repository: Repository,
}

impl BorrowersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all borrowers
    pub async fn list(&self) -> AppResult<Vec<Borrower>> {
        self.repository.borrowers.list().await
    }

    /// Get borrower by ID
    pub async fn get(&self, id: i64) -> AppResult<Borrower> {
        self.repository.borrowers.get_by_id(id).await
    }

    /// Find-or-create a borrower by email. The second element reports
    /// whether a new row was created.
    pub async fn resolve_or_create(&self, borrower: CreateBorrower) -> AppResult<(Borrower, bool)> {
        borrower
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.borrowers.resolve_or_create(&borrower).await
    }

    /// Update a borrower
    pub async fn update(&self, id: i64, update: UpdateBorrower) -> AppResult<Borrower> {
        self.repository.borrowers.update(id, &update).await
    }

    /// Delete a borrower (refused while loans reference them)
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.borrowers.delete(id).await
    }
}
