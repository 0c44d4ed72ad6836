//! Checkout endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{Checkout, CreateCheckout, UpdateCheckout},
    services::lifecycle::{Transition, TransitionOutcome},
    AppState,
};

use super::{
    books::unexpected,
    extract::{optional_json, AppJson},
    parse_id, AuthenticatedUser,
};

/// Check out a pending order
///
/// The body may be omitted; the checkout then uses the book's list price.
#[utoipa::path(
    post,
    path = "/orders/{id}/checkout",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    request_body = CreateCheckout,
    responses(
        (status = 201, description = "Checkout created", body = Checkout),
        (status = 400, description = "Malformed body", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the orderer", body = crate::error::ErrorResponse),
        (status = 409, description = "Order is not pending or already checked out", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Checkout>)> {
    let order_id = parse_id("Order", &id)?;
    let request: CreateCheckout = optional_json(&body)?;
    match state
        .services
        .lifecycle
        .apply(Some(&principal), Transition::Checkout { order_id, request })
        .await?
    {
        TransitionOutcome::Checkout(checkout) => Ok((StatusCode::CREATED, Json(checkout))),
        other => Err(unexpected(other)),
    }
}

/// Edit an unreturned checkout
#[utoipa::path(
    put,
    path = "/checkouts/{id}",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Checkout ID")),
    request_body = UpdateCheckout,
    responses(
        (status = 200, description = "Checkout updated", body = Checkout),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Checkout already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
    AppJson(changes): AppJson<UpdateCheckout>,
) -> AppResult<Json<Checkout>> {
    let checkout_id = parse_id("Checkout", &id)?;
    match state
        .services
        .lifecycle
        .apply(Some(&principal), Transition::UpdateCheckout { checkout_id, changes })
        .await?
    {
        TransitionOutcome::Checkout(checkout) => Ok(Json(checkout)),
        other => Err(unexpected(other)),
    }
}

/// Return a checked-out book
#[utoipa::path(
    post,
    path = "/checkouts/{id}/return",
    tag = "checkouts",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Checkout ID")),
    responses(
        (status = 200, description = "Book returned", body = Checkout),
        (status = 409, description = "Checkout already returned", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_checkout(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Checkout>> {
    let checkout_id = parse_id("Checkout", &id)?;
    match state
        .services
        .lifecycle
        .apply(Some(&principal), Transition::Return { checkout_id })
        .await?
    {
        TransitionOutcome::Checkout(checkout) => Ok(Json(checkout)),
        other => Err(unexpected(other)),
    }
}
