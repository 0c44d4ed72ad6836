//! Orders repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Order, OrderStatus},
};

use super::on_unique_violation;

#[derive(Clone)]
pub struct OrdersRepository {
    pool: Pool<Postgres>,
}

impl OrdersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get order by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    pub async fn owner_of(&self, id: i32) -> AppResult<Option<i32>> {
        let owner = sqlx::query_scalar::<_, i32>("SELECT user_id FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    /// Find the open order of a book (pending, or fulfilled and not yet returned)
    pub async fn find_open(&self, book_id: i32) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT o.*
            FROM orders o
            LEFT JOIN checkouts c ON c.order_id = o.id
            WHERE o.book_id = $1
              AND (
                  o.status = 'pending'
                  OR (o.status = 'fulfilled' AND c.id IS NOT NULL AND c.return_date IS NULL)
              )
            ORDER BY o.order_date DESC
            LIMIT 1
            "#,
        )
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    /// Create a pending order; the partial unique index rejects a second pending order
    pub async fn create(&self, book_id: i32, user_id: i32) -> AppResult<Order> {
        sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (book_id, user_id, status, order_date)
            VALUES ($1, $2, $3, NOW())
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(OrderStatus::Pending)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                AppError::ConcurrentModification(format!("book {} already has a pending order", book_id))
            })
        })
    }

    /// Conditional status write; false when the stored status is not `expected`
    pub async fn set_status(&self, id: i32, expected: OrderStatus, next: OrderStatus) -> AppResult<bool> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2 AND status = $3")
            .bind(next)
            .bind(id)
            .bind(expected)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Orders placed by a user, newest first
    pub async fn by_user(&self, user_id: i32) -> AppResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY order_date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }
}
