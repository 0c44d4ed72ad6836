//! Checkout model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::validate_price;

/// Checkout created from a fulfilled order
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Checkout {
    pub id: i32,
    pub order_id: i32,
    pub user_id: i32,
    #[schema(value_type = String, example = "12.50")]
    pub total_price: Decimal,
    pub checkout_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

impl Checkout {
    pub fn is_returned(&self) -> bool {
        self.return_date.is_some()
    }
}

/// Checkout request for a pending order
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateCheckout {
    /// Defaults to the book's listed price
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>)]
    pub total_price: Option<Decimal>,
    #[validate(length(max = 2000, message = "Note is too long"))]
    pub note: Option<String>,
}

/// Mutable checkout fields
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCheckout {
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>)]
    pub total_price: Option<Decimal>,
    #[validate(length(max = 2000, message = "Note is too long"))]
    pub note: Option<String>,
    pub return_date: Option<DateTime<Utc>>,
}

impl UpdateCheckout {
    pub fn is_empty(&self) -> bool {
        self.total_price.is_none() && self.note.is_none() && self.return_date.is_none()
    }
}

/// Row values for a new checkout
#[derive(Debug, Clone, PartialEq)]
pub struct NewCheckout {
    pub order_id: i32,
    pub user_id: i32,
    pub total_price: Decimal,
    pub checkout_date: DateTime<Utc>,
    pub note: Option<String>,
}
