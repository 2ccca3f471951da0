//! Author resolution service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor, UpdateAuthor},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
}

impl AuthorsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all authors
    pub async fn list(&self) -> AppResult<Vec<Author>> {
        self.repository.authors.list().await
    }

    /// Get author by ID
    pub async fn get(&self, id: i64) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    /// Find-or-create an author by name. Repeated and concurrent calls
    /// for the same name (in any casing) converge on a single author;
    /// the second element reports whether a new row was created.
    pub async fn resolve_or_create(&self, author: CreateAuthor) -> AppResult<(Author, bool)> {
        author
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        self.repository.authors.resolve_or_create(&author).await
    }

    /// Update an author
    pub async fn update(&self, id: i64, update: UpdateAuthor) -> AppResult<Author> {
        self.repository.authors.update(id, &update).await
    }

    /// Delete an author (refused while referenced by a book)
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.authors.delete(id).await
    }
}
