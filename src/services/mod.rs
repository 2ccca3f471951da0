//! Business logic services

pub mod authors;
pub mod borrowers;
pub mod catalog;
pub mod loans;
pub mod overdue;

use crate::{config::LoansConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub borrowers: borrowers::BorrowersService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, loans_config: LoansConfig) -> Self {
        Self {
            authors: authors::AuthorsService::new(repository.clone()),
            borrowers: borrowers::BorrowersService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository, loans_config),
        }
    }
}
