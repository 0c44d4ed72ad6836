//! Users repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{CreateAccount, UpdateProfile, User},
};

use super::on_unique_violation;

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get user by email (case-insensitive)
    pub async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Create a new user with an already hashed password
    pub async fn create(&self, account: &CreateAccount, password_hash: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, phone, password, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING *
            "#,
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.phone)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, || AppError::Conflict("Email already registered".to_string())))
    }

    /// Replace name and email; the phone only changes when given
    pub async fn update_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET name = $1, email = $2, phone = COALESCE($3, phone)
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| on_unique_violation(e, || AppError::Conflict("Email already registered".to_string())))
    }

    pub async fn set_password(&self, id: i32, password_hash: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
