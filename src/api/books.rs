//! Book listing endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook, UpdateBook},
    services::lifecycle::{Transition, TransitionOutcome},
    AppState,
};

use super::{extract::AppJson, parse_id, AuthenticatedUser};

/// List a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book listed", body = Book),
        (status = 400, description = "Invalid input or unknown author, language or category", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    AppJson(book): AppJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    match state
        .services
        .lifecycle
        .apply(Some(&principal), Transition::List(book))
        .await?
    {
        TransitionOutcome::Book(book) => Ok((StatusCode::CREATED, Json(book))),
        other => Err(unexpected(other)),
    }
}

/// Books open to orders, newest listing first
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Available books", body = Vec<Book>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn available_books(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.available_books(Some(&principal)).await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let id = parse_id("Book", &id)?;
    let book = state.services.catalog.get_book(Some(&principal), id).await?;
    Ok(Json(book))
}

/// Update descriptive fields of a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Not the lister", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
    AppJson(changes): AppJson<UpdateBook>,
) -> AppResult<Json<Book>> {
    let id = parse_id("Book", &id)?;
    let book = state.services.catalog.update_book(Some(&principal), id, changes).await?;
    Ok(Json(book))
}

/// Remove an available book
///
/// The listing is retired; orders and checkouts of the book are kept.
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = Book),
        (status = 403, description = "Not the lister", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is reserved or checked out", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book_id = parse_id("Book", &id)?;
    match state
        .services
        .lifecycle
        .apply(Some(&principal), Transition::DeleteBook { book_id })
        .await?
    {
        TransitionOutcome::BookDeleted(book) => Ok(Json(book)),
        other => Err(unexpected(other)),
    }
}

/// A transition answered with an outcome of another shape
pub(crate) fn unexpected(outcome: TransitionOutcome) -> AppError {
    AppError::Internal(format!("Unexpected transition outcome: {:?}", outcome))
}
