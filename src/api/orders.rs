//! Order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::Order,
    services::lifecycle::{Transition, TransitionOutcome},
    AppState,
};

use super::{books::unexpected, parse_id, AuthenticatedUser};

/// Order an available book
#[utoipa::path(
    post,
    path = "/books/{id}/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 201, description = "Order placed", body = Order),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book is not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let book_id = parse_id("Book", &id)?;
    match state
        .services
        .lifecycle
        .apply(Some(&principal), Transition::Order { book_id })
        .await?
    {
        TransitionOutcome::Order(order) => Ok((StatusCode::CREATED, Json(order))),
        other => Err(unexpected(other)),
    }
}

/// Orders placed by the current user
#[utoipa::path(
    get,
    path = "/orders",
    tag = "orders",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's orders, newest first", body = Vec<Order>)
    )
)]
pub async fn my_orders(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state.services.catalog.user_orders(Some(&principal)).await?;
    Ok(Json(orders))
}

/// Get order by ID
#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order details", body = Order),
        (status = 404, description = "Order not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let id = parse_id("Order", &id)?;
    let order = state.services.catalog.get_order(Some(&principal), id).await?;
    Ok(Json(order))
}

/// Cancel a pending order
#[utoipa::path(
    post,
    path = "/orders/{id}/cancel",
    tag = "orders",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order cancelled", body = Order),
        (status = 403, description = "Not the orderer", body = crate::error::ErrorResponse),
        (status = 409, description = "Order is not pending", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order_id = parse_id("Order", &id)?;
    match state
        .services
        .lifecycle
        .apply(Some(&principal), Transition::CancelOrder { order_id })
        .await?
    {
        TransitionOutcome::Order(order) => Ok(Json(order)),
        other => Err(unexpected(other)),
    }
}
