//! Books repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::book::Book,
};

/// Column list shared by every book query; `available` is stored as an
/// INTEGER flag and decoded as bool.
const SELECT_BOOK: &str = r#"
    SELECT b.id, b.title, b.author_id, a.name AS author_name, b.isbn,
           b.publication_year, b.genre, b.pages, b.image_url, b.description,
           b.available
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

/// Field values for an insert or full-row update, with the author
/// already resolved to an id.
#[derive(Debug)]
pub struct BookRecord {
    pub title: String,
    pub author_id: i64,
    pub isbn: Option<String>,
    pub publication_year: Option<i32>,
    pub genre: Option<String>,
    pub pages: Option<i32>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// List all books joined with author names
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("{} ORDER BY b.title", SELECT_BOOK))
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("{} WHERE b.id = ?", SELECT_BOOK))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a new book. New books start available.
    pub async fn create(&self, record: &BookRecord) -> AppResult<Book> {
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO books (title, author_id, isbn, publication_year, genre,
                               pages, image_url, description, available)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)
            RETURNING id
            "#,
        )
        .bind(&record.title)
        .bind(record.author_id)
        .bind(&record.isbn)
        .bind(record.publication_year)
        .bind(&record.genre)
        .bind(record.pages)
        .bind(&record.image_url)
        .bind(&record.description)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => self.get_by_id(id).await,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!(
                    "Book with ISBN {} already exists",
                    record.isbn.as_deref().unwrap_or("?")
                ),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Update a book's catalog fields. Availability is never touched here;
    /// only the loan workflows flip it.
    pub async fn update(&self, id: i64, record: &BookRecord) -> AppResult<Book> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = ?, author_id = ?, isbn = ?, publication_year = ?,
                genre = ?, pages = ?, image_url = ?, description = ?
            WHERE id = ?
            "#,
        )
        .bind(&record.title)
        .bind(record.author_id)
        .bind(&record.isbn)
        .bind(record.publication_year)
        .bind(&record.genre)
        .bind(record.pages)
        .bind(&record.image_url)
        .bind(&record.description)
        .bind(id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => {
                Err(AppError::NotFound(format!("Book with id {} not found", id)))
            }
            Ok(_) => self.get_by_id(id).await,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!(
                    "Book with ISBN {} already exists",
                    record.isbn.as_deref().unwrap_or("?")
                ),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a book. The loan ledger is append-only and must remain
    /// auditable, so deletion is refused while any loan (active or
    /// returned) references the book.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let has_loans: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM loans WHERE book_id = ?)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if has_loans {
            return Err(AppError::Conflict(
                "Cannot delete book with loan history".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }

        tx.commit().await?;
        tracing::info!("Deleted book id={}", id);
        Ok(())
    }
}
