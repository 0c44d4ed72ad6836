//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{user::LoginRequest, ChangePassword, CreateAccount, PasswordCheck, UpdateProfile, User},
    AppState,
};

use super::{extract::AppJson, AuthenticatedUser};

/// Token and account returned by registration and sign-in
#[derive(Serialize, ToSchema)]
pub struct AuthPayload {
    /// Bearer credential
    pub token: String,
    pub user: User,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = CreateAccount,
    responses(
        (status = 201, description = "Account created", body = AuthPayload),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(account): AppJson<CreateAccount>,
) -> AppResult<(StatusCode, Json<AuthPayload>)> {
    let (token, user) = state.services.accounts.register(account).await?;
    Ok((StatusCode::CREATED, Json(AuthPayload { token, user })))
}

/// Sign in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthPayload),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(State(state): State<AppState>, AppJson(request): AppJson<LoginRequest>) -> AppResult<Json<AuthPayload>> {
    let (token, user) = state.services.accounts.login(&request).await?;
    Ok(Json(AuthPayload { token, user }))
}

/// Current account
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = User),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(State(state): State<AppState>, AuthenticatedUser(principal): AuthenticatedUser) -> AppResult<Json<User>> {
    let user = state.services.accounts.me(Some(&principal)).await?;
    Ok(Json(user))
}

/// Edit the current account's name, email and phone
#[utoipa::path(
    put,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    AppJson(profile): AppJson<UpdateProfile>,
) -> AppResult<Json<User>> {
    let user = state.services.accounts.update_profile(Some(&principal), profile).await?;
    Ok(Json(user))
}

/// Confirm the current password, e.g. before changing it
#[utoipa::path(
    post,
    path = "/auth/password/check",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = PasswordCheck,
    responses(
        (status = 200, description = "Password matches", body = User),
        (status = 400, description = "Password does not match", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_password(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    AppJson(check): AppJson<PasswordCheck>,
) -> AppResult<Json<User>> {
    let user = state.services.accounts.check_password(Some(&principal), &check).await?;
    Ok(Json(user))
}

/// Set a new password for the current account
#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = User),
        (status = 400, description = "Password too short", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_password(
    State(state): State<AppState>,
    AuthenticatedUser(principal): AuthenticatedUser,
    AppJson(change): AppJson<ChangePassword>,
) -> AppResult<Json<User>> {
    let user = state.services.accounts.update_password(Some(&principal), change).await?;
    Ok(Json(user))
}
