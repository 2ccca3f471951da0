//! Book catalog management service

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::CreateAuthor,
        book::{Book, CreateBook, UpdateBook, DEFAULT_IMAGE_URL},
    },
    repository::{books::BookRecord, Repository},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List all books with author names and availability
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Create a new book. The author reference is either an existing id
    /// or a raw name resolved via find-or-create.
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let author_id = self
            .resolve_author(book.author_id, book.author.as_deref())
            .await?;

        let record = BookRecord {
            title: book.title,
            author_id,
            isbn: book.isbn,
            publication_year: book.publication_year,
            genre: book.genre,
            pages: book.pages,
            image_url: book.image_url.or_else(|| Some(DEFAULT_IMAGE_URL.to_string())),
            description: book.description,
        };

        self.repository.books.create(&record).await
    }

    /// Update a book; absent fields keep their current values
    pub async fn update_book(&self, id: i64, update: UpdateBook) -> AppResult<Book> {
        let current = self.repository.books.get_by_id(id).await?;

        let author_id = match (update.author_id, update.author.as_deref()) {
            (None, None) => current.author_id,
            (author_id, author) => self.resolve_author(author_id, author).await?,
        };

        let title = update.title.unwrap_or(current.title);
        if title.trim().is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }

        let record = BookRecord {
            title,
            author_id,
            isbn: update.isbn.or(current.isbn),
            publication_year: update.publication_year.or(current.publication_year),
            genre: update.genre.or(current.genre),
            pages: update.pages.or(current.pages),
            image_url: update.image_url.or(current.image_url),
            description: update.description.or(current.description),
        };

        self.repository.books.update(id, &record).await
    }

    /// Delete a book (refused while any loan references it)
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books.delete(id).await
    }

    /// Resolve an author reference to an id. A supplied id must exist;
    /// a supplied name is resolved find-or-create.
    async fn resolve_author(
        &self,
        author_id: Option<i64>,
        author_name: Option<&str>,
    ) -> AppResult<i64> {
        if let Some(id) = author_id {
            return match self.repository.authors.get_by_id(id).await {
                Ok(author) => Ok(author.id),
                Err(AppError::NotFound(_)) => Err(AppError::Validation(format!(
                    "Author with ID {} does not exist",
                    id
                ))),
                Err(e) => Err(e),
            };
        }

        let name = author_name.unwrap_or("").trim();
        if name.is_empty() {
            return Err(AppError::Validation("Author is required".to_string()));
        }

        let (author, _created) = self
            .repository
            .authors
            .resolve_or_create(&CreateAuthor {
                name: name.to_string(),
                biography: None,
                birth_date: None,
            })
            .await?;

        Ok(author.id)
    }
}
