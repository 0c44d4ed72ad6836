//! Bookshare server
//!
//! Book lending marketplace: users list books, order them and turn orders
//! into checkouts. The lifecycle and authorization core lives in
//! [`services`]; [`api`] is a thin REST and SSE surface over it.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
