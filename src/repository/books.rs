//! Books repository for database operations

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::{Book, BookStatus, CreateBook, UpdateBook},
};

use super::on_foreign_key_violation;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get a listed (not deleted) book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    pub async fn owner_of(&self, id: i32) -> AppResult<Option<i32>> {
        let owner = sqlx::query_scalar::<_, i32>("SELECT owner_id FROM books WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    /// Create a new listing, always `available`
    pub async fn create(&self, owner_id: i32, book: &CreateBook) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (
                title, author_id, language_id, category_id, owner_id, status,
                condition, price, isbn, description, published_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(book.language_id)
        .bind(book.category_id)
        .bind(owner_id)
        .bind(BookStatus::Available)
        .bind(&book.condition)
        .bind(book.price)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(&book.published_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_foreign_key_violation(e, "books"))?;

        Ok(book)
    }

    /// Books open to orders, newest listing first
    pub async fn available(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT * FROM books
            WHERE status = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(BookStatus::Available)
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    /// Update descriptive fields only
    pub async fn update(&self, id: i32, changes: &UpdateBook) -> AppResult<Option<Book>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE books SET updated_at = NOW()");

        if let Some(ref title) = changes.title {
            builder.push(", title = ").push_bind(title);
        }
        if let Some(author_id) = changes.author_id {
            builder.push(", author_id = ").push_bind(author_id);
        }
        if let Some(language_id) = changes.language_id {
            builder.push(", language_id = ").push_bind(language_id);
        }
        if let Some(category_id) = changes.category_id {
            builder.push(", category_id = ").push_bind(category_id);
        }
        if let Some(ref condition) = changes.condition {
            builder.push(", condition = ").push_bind(condition);
        }
        if let Some(price) = changes.price {
            builder.push(", price = ").push_bind(price);
        }
        if let Some(ref isbn) = changes.isbn {
            builder.push(", isbn = ").push_bind(isbn);
        }
        if let Some(ref description) = changes.description {
            builder.push(", description = ").push_bind(description);
        }
        if let Some(ref published_date) = changes.published_date {
            builder.push(", published_date = ").push_bind(published_date);
        }

        builder
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND deleted_at IS NULL RETURNING *");

        let book = builder
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| on_foreign_key_violation(e, "books"))?;
        Ok(book)
    }

    /// Conditional status write; false when the stored status is not `expected`
    pub async fn set_status(&self, id: i32, expected: BookStatus, next: BookStatus) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET status = $1, updated_at = NOW() WHERE id = $2 AND status = $3 AND deleted_at IS NULL",
        )
        .bind(next)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Retire a listing; its orders and checkouts stay as lending history
    pub async fn delete(&self, id: i32, expected: BookStatus) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE books SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
