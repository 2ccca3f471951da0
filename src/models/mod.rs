//! Data models for Libris

pub mod author;
pub mod book;
pub mod borrower;
pub mod loan;

// Re-export commonly used types
pub use author::Author;
pub use book::Book;
pub use borrower::Borrower;
pub use loan::{Loan, LoanDetails, LoanStatus};
