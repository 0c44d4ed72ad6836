//! Authors, languages and categories endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{Author, Category, CreateAuthor, Language},
    AppState,
};

use super::{extract::AppJson, AuthenticatedUser};

/// Add an author books can reference
#[utoipa::path(
    post,
    path = "/authors",
    tag = "reference",
    security(("bearer_auth" = [])),
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author added", body = Author),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_author(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    AppJson(author): AppJson<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Author>)> {
    let author = state.services.catalog.add_author(Some(&principal), author).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

/// Authors, most recently added first
#[utoipa::path(
    get,
    path = "/authors",
    tag = "reference",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authors", body = Vec<Author>)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<Vec<Author>>> {
    Ok(Json(state.services.catalog.authors(Some(&principal)).await?))
}

#[utoipa::path(
    get,
    path = "/languages",
    tag = "reference",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Languages", body = Vec<Language>)
    )
)]
pub async fn list_languages(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<Vec<Language>>> {
    Ok(Json(state.services.catalog.languages(Some(&principal)).await?))
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "reference",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(state.services.catalog.categories(Some(&principal)).await?))
}
