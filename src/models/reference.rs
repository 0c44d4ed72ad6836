//! Reference data books point at: authors, languages and categories

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Author used for books whose author is not known; always id 1
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Languages seeded on a fresh store, in id order starting at 1
pub const SEEDED_LANGUAGES: [&str; 8] = [
    "English",
    "French",
    "Spanish",
    "German",
    "Italian",
    "Portuguese",
    "Japanese",
    "Other",
];

/// Categories seeded on a fresh store, in id order starting at 1
pub const SEEDED_CATEGORIES: [&str; 10] = [
    "Fiction",
    "Non-fiction",
    "Science fiction",
    "Fantasy",
    "Mystery",
    "Biography",
    "History",
    "Science",
    "Children",
    "Poetry",
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub id: i32,
    pub name: String,
}

/// New author request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 200, message = "Author name is required"))]
    pub name: String,
}
