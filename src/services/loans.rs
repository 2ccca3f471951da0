//! Loan workflows: borrowing and returning books

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    config::LoansConfig,
    error::{AppError, AppResult},
    models::loan::{CreateLoan, LoanDetails, LoanStatus, LoanWithRefs},
    repository::Repository,
};

use super::overdue;

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    policy: LoansConfig,
}

impl LoansService {
    pub fn new(repository: Repository, policy: LoansConfig) -> Self {
        Self { repository, policy }
    }

    /// Full loan ledger
    pub async fn list(&self) -> AppResult<Vec<LoanDetails>> {
        let now = Utc::now();
        let loans = self.repository.loans.list().await?;
        Ok(loans.into_iter().map(|l| to_details(l, now)).collect())
    }

    /// Active loans only
    pub async fn list_active(&self) -> AppResult<Vec<LoanDetails>> {
        let now = Utc::now();
        let loans = self.repository.loans.list_active().await?;
        Ok(loans.into_iter().map(|l| to_details(l, now)).collect())
    }

    /// Borrow a book.
    ///
    /// Resolves the borrower (by id, or find-or-create by email), then
    /// claims the book and inserts the loan as one atomic unit. Of two
    /// concurrent borrows of the same book exactly one succeeds; the
    /// other fails with Conflict.
    pub async fn borrow(&self, request: CreateLoan) -> AppResult<LoanDetails> {
        let days_to_return = request
            .days_to_return
            .unwrap_or(self.policy.default_loan_days);

        if days_to_return < 1 {
            return Err(AppError::Validation(
                "days_to_return must be a positive number of days".to_string(),
            ));
        }
        if days_to_return > self.policy.max_loan_days {
            return Err(AppError::Validation(format!(
                "days_to_return may not exceed {} days",
                self.policy.max_loan_days
            )));
        }

        let borrower_id = match (request.borrower_id, request.borrower) {
            (Some(id), _) => self.repository.borrowers.get_by_id(id).await?.id,
            (None, Some(borrower)) => {
                borrower
                    .validate()
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                let (resolved, _created) =
                    self.repository.borrowers.resolve_or_create(&borrower).await?;
                resolved.id
            }
            (None, None) => {
                return Err(AppError::Validation(
                    "borrower_id or borrower details are required".to_string(),
                ))
            }
        };

        let now = Utc::now();
        let loan_date = now.date_naive();
        let due_date = overdue::due_date(loan_date, days_to_return);

        let loan = self
            .repository
            .loans
            .create(request.book_id, borrower_id, loan_date, due_date)
            .await?;

        let details = self.repository.loans.get_details(loan.id).await?;
        Ok(to_details(details, now))
    }

    /// Return a borrowed book. The loan's status flip and the book's
    /// availability flip happen atomically in the repository.
    pub async fn return_loan(&self, loan_id: i64) -> AppResult<LoanDetails> {
        let now = Utc::now();
        let loan = self
            .repository
            .loans
            .return_loan(loan_id, now.date_naive())
            .await?;

        let details = self.repository.loans.get_details(loan.id).await?;
        Ok(to_details(details, now))
    }
}

/// Attach display-only overdue information to a ledger row
fn to_details(loan: LoanWithRefs, now: DateTime<Utc>) -> LoanDetails {
    let days_remaining = overdue::days_remaining(loan.due_date, now);
    LoanDetails {
        id: loan.id,
        book_id: loan.book_id,
        book_title: loan.book_title,
        borrower_id: loan.borrower_id,
        borrower_name: loan.borrower_name,
        loan_date: loan.loan_date,
        due_date: loan.due_date,
        return_date: loan.return_date,
        status: loan.status,
        days_remaining,
        is_overdue: loan.status == LoanStatus::Active && overdue::is_overdue(loan.due_date, now),
    }
}
