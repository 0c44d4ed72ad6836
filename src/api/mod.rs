//! API handlers for Bookshare REST endpoints

pub mod auth;
pub mod books;
pub mod checkouts;
pub mod extract;
pub mod health;
pub mod openapi;
pub mod orders;
pub mod reference;
pub mod subscriptions;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post, put},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    error::{AppError, AppResult},
    models::Principal,
    AppState,
};

/// Extractor for the principal resolved from the bearer credential
pub struct AuthenticatedUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A missing or non-Bearer header resolves like an absent credential
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .ok();
        let principal = state
            .services
            .identity
            .resolve(bearer.as_ref().map(|TypedHeader(auth)| auth.token()))?;

        Ok(AuthenticatedUser(principal))
    }
}

/// Parse a path identifier; anything that is not an id cannot name a resource
pub(crate) fn parse_id(kind: &str, raw: &str) -> AppResult<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| AppError::NotFound(format!("{} with id {} not found", kind, raw)))
}

/// Routes mounted under `/api/v1`
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me).put(auth::update_profile))
        .route("/auth/password", put(auth::update_password))
        .route("/auth/password/check", post(auth::check_password))
        // Reference data
        .route("/authors", get(reference::list_authors).post(reference::add_author))
        .route("/languages", get(reference::list_languages))
        .route("/categories", get(reference::list_categories))
        // Books
        .route("/books", get(books::available_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .route("/books/:id/orders", post(orders::create_order))
        // Orders
        .route("/orders", get(orders::my_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/cancel", post(orders::cancel_order))
        .route("/orders/:id/checkout", post(checkouts::create_checkout))
        // Checkouts
        .route("/checkouts/:id", put(checkouts::update_checkout))
        .route("/checkouts/:id/return", post(checkouts::return_checkout))
        // Lifecycle events
        .route("/subscriptions/:topic", get(subscriptions::subscribe))
        .with_state(state)
}
