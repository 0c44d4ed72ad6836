//! Checkouts repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{Checkout, NewCheckout, UpdateCheckout},
};

use super::on_unique_violation;

#[derive(Clone)]
pub struct CheckoutsRepository {
    pool: Pool<Postgres>,
}

impl CheckoutsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get checkout by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<Checkout>> {
        let checkout = sqlx::query_as::<_, Checkout>("SELECT * FROM checkouts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(checkout)
    }

    pub async fn get_by_order(&self, order_id: i32) -> AppResult<Option<Checkout>> {
        let checkout = sqlx::query_as::<_, Checkout>("SELECT * FROM checkouts WHERE order_id = $1")
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(checkout)
    }

    pub async fn owner_of(&self, id: i32) -> AppResult<Option<i32>> {
        let owner = sqlx::query_scalar::<_, i32>("SELECT user_id FROM checkouts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    /// Create a checkout; `order_id` is unique
    pub async fn create(&self, checkout: &NewCheckout) -> AppResult<Checkout> {
        sqlx::query_as::<_, Checkout>(
            r#"
            INSERT INTO checkouts (order_id, user_id, total_price, checkout_date, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(checkout.order_id)
        .bind(checkout.user_id)
        .bind(checkout.total_price)
        .bind(checkout.checkout_date)
        .bind(&checkout.note)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            on_unique_violation(e, || {
                AppError::ConcurrentModification(format!(
                    "order {} already has a checkout",
                    checkout.order_id
                ))
            })
        })
    }

    /// Update mutable fields while the checkout is not returned
    pub async fn update_unreturned(&self, id: i32, changes: &UpdateCheckout) -> AppResult<Option<Checkout>> {
        let checkout = sqlx::query_as::<_, Checkout>(
            r#"
            UPDATE checkouts
            SET total_price = COALESCE($1, total_price),
                note = COALESCE($2, note),
                return_date = COALESCE($3, return_date)
            WHERE id = $4 AND return_date IS NULL
            RETURNING *
            "#,
        )
        .bind(changes.total_price)
        .bind(&changes.note)
        .bind(changes.return_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(checkout)
    }
}
