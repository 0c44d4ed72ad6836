//! Order model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::OrderStatus;

/// Order placed by a prospective borrower against a book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Order {
    pub id: i32,
    pub book_id: i32,
    /// Orderer
    pub user_id: i32,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
}
