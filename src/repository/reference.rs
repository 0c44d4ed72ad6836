//! Authors, languages and categories

use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Author, Category, CreateAuthor, Language},
};

#[derive(Clone)]
pub struct ReferenceRepository {
    pool: Pool<Postgres>,
}

impl ReferenceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create_author(&self, author: &CreateAuthor) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(
            "INSERT INTO authors (name, created_at) VALUES ($1, NOW()) RETURNING id, name, created_at",
        )
        .bind(author.name.trim())
        .fetch_one(&self.pool)
        .await?;
        Ok(author)
    }

    /// Authors, most recently added first
    pub async fn authors(&self) -> AppResult<Vec<Author>> {
        let authors = sqlx::query_as::<_, Author>(
            "SELECT id, name, created_at FROM authors ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(authors)
    }

    pub async fn languages(&self) -> AppResult<Vec<Language>> {
        let languages = sqlx::query_as::<_, Language>("SELECT id, name FROM languages ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(languages)
    }

    pub async fn categories(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }
}
