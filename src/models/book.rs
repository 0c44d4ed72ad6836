//! Book listing model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::enums::BookStatus;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    pub language_id: i32,
    pub category_id: i32,
    /// Lister of the book
    pub owner_id: i32,
    pub status: BookStatus,
    pub condition: String,
    #[schema(value_type = String, example = "12.50")]
    pub price: Decimal,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New listing request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 500, message = "Title is required"))]
    pub title: String,
    pub author_id: i32,
    pub language_id: i32,
    pub category_id: i32,
    #[validate(length(min = 1, message = "Condition is required"))]
    pub condition: String,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = String, example = "12.50")]
    pub price: Decimal,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
}

/// Descriptive metadata update; status is never editable here
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 500, message = "Title cannot be empty"))]
    pub title: Option<String>,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    pub category_id: Option<i32>,
    #[validate(length(min = 1, message = "Condition cannot be empty"))]
    pub condition: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
}

impl UpdateBook {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author_id.is_none()
            && self.language_id.is_none()
            && self.category_id.is_none()
            && self.condition.is_none()
            && self.price.is_none()
            && self.isbn.is_none()
            && self.description.is_none()
            && self.published_date.is_none()
    }
}

/// Largest price a `NUMERIC(10, 2)` column holds
pub fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Prices are stored as `NUMERIC(10, 2)`: non-negative, at most two decimals
pub(crate) fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    let message = if price.is_sign_negative() && !price.is_zero() {
        "Price cannot be negative"
    } else if *price > max_price() {
        "Price cannot exceed 99999999.99"
    } else if price.normalize().scale() > 2 {
        "Price cannot have more than two decimals"
    } else {
        return Ok(());
    };

    let mut err = ValidationError::new("price");
    err.message = Some(message.into());
    Err(err)
}
