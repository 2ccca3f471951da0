//! Authors repository for database operations

use sqlx::{Pool, Sqlite};

use crate::{
    error::{AppError, AppResult},
    models::author::{Author, CreateAuthor, UpdateAuthor},
};

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Sqlite>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// List all authors ordered by name
    pub async fn list(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT id, name, biography, birth_date FROM authors ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(authors)
    }

    /// Get author by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, name, biography, birth_date FROM authors WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    /// Find author by case-insensitive name
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, name, biography, birth_date FROM authors WHERE name = ? COLLATE NOCASE",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    /// Find-or-create an author by name, safe under concurrent callers.
    ///
    /// Creation is an atomic "insert if absent" against the case-insensitive
    /// unique constraint; when the insert loses a race it returns no row and
    /// the now-existing author is re-fetched instead of surfacing an error.
    /// Returns the author and whether a new row was created.
    pub async fn resolve_or_create(&self, author: &CreateAuthor) -> AppResult<(Author, bool)> {
        let name = author.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Author name is required".to_string()));
        }

        let inserted_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO authors (name, biography, birth_date)
            VALUES (?, ?, ?)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(&author.biography)
        .bind(author.birth_date)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = inserted_id {
            tracing::info!("Created author '{}' (id={})", name, id);
            return Ok((self.get_by_id(id).await?, true));
        }

        // Lost the insert race (or the author pre-existed): reconcile.
        let existing = self.find_by_name(name).await?.ok_or_else(|| {
            AppError::Internal(format!("Author '{}' could not be resolved", name))
        })?;

        Ok((existing, false))
    }

    /// Update an author
    pub async fn update(&self, id: i64, update: &UpdateAuthor) -> AppResult<Author> {
        let current = self.get_by_id(id).await?;

        let name = update.name.as_deref().unwrap_or(&current.name).trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Author name is required".to_string()));
        }

        let result = sqlx::query("UPDATE authors SET name = ?, biography = ?, birth_date = ? WHERE id = ?")
            .bind(&name)
            .bind(update.biography.as_ref().or(current.biography.as_ref()))
            .bind(update.birth_date.or(current.birth_date))
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => self.get_by_id(id).await,
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AppError::Conflict(
                format!("An author named '{}' already exists", name),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete an author. Refused while any book references it.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE author_id = ?)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if referenced {
            return Err(AppError::Conflict(
                "Cannot delete author with books in the catalog".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Author with id {} not found",
                id
            )));
        }

        tx.commit().await?;
        Ok(())
    }
}
