//! Error types for Bookshare server

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable error kinds callers can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthenticated,
    Denied,
    AuthorizationIndeterminate,
    InvalidTransition,
    ConcurrentModification,
    NotFound,
    ValidationFailure,
    Conflict,
    CascadeIncomplete,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Denied => "denied",
            ErrorKind::AuthorizationIndeterminate => "authorization_indeterminate",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::ConcurrentModification => "concurrent_modification",
            ErrorKind::NotFound => "not_found",
            ErrorKind::ValidationFailure => "validation_failure",
            ErrorKind::Conflict => "conflict",
            ErrorKind::CascadeIncomplete => "cascade_incomplete",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Unauthenticated(String),

    #[error("Permission denied: {0}")]
    Denied(String),

    #[error("Authorization could not be evaluated: {0}")]
    AuthorizationIndeterminate(String),

    #[error("Invalid transition '{transition}': {observed}")]
    InvalidTransition {
        transition: &'static str,
        observed: String,
    },

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Transition '{transition}' stopped at step '{failed_step}' after committing {committed:?}: {cause}")]
    CascadeIncomplete {
        transition: &'static str,
        failed_step: &'static str,
        committed: Vec<&'static str>,
        #[source]
        cause: Box<AppError>,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation failure on a specific input field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    pub fn invalid_transition(transition: &'static str, observed: impl Into<String>) -> Self {
        AppError::InvalidTransition {
            transition,
            observed: observed.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            AppError::Denied(_) => ErrorKind::Denied,
            AppError::AuthorizationIndeterminate(_) => ErrorKind::AuthorizationIndeterminate,
            AppError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            AppError::ConcurrentModification(_) => ErrorKind::ConcurrentModification,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Validation { .. } => ErrorKind::ValidationFailure,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::CascadeIncomplete { .. } => ErrorKind::CascadeIncomplete,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Input field the error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            AppError::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .min_by_key(|(field, _)| field.to_string())
            .and_then(|(field, errs)| errs.first().map(|e| (field.to_string(), e.clone())));

        match first {
            Some((field, err)) => AppError::Validation {
                message: err
                    .message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field)),
                field: Some(field),
            },
            None => AppError::Validation {
                message: errors.to_string(),
                field: None,
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        AppError::Validation {
            field: rejected_field(&message),
            message,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        let message = err.to_string();
        AppError::Validation {
            field: rejected_field(&message),
            message,
        }
    }
}

/// Field named by a body deserialization message, either as the leading
/// path (`title: invalid type ...`) or as a missing field (`missing field `title``)
fn rejected_field(message: &str) -> Option<String> {
    let detail = message.split_once("target type: ").map_or(message, |(_, rest)| rest);

    if let Some((_, rest)) = detail.split_once("missing field `") {
        return rest.split_once('`').map(|(field, _)| field.to_string());
    }
    let (path, _) = detail.split_once(": ")?;
    let is_path = !path.is_empty() && !path.contains(char::is_whitespace);
    is_path.then(|| path.to_string())
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Denied(_) => StatusCode::FORBIDDEN,
            AppError::AuthorizationIndeterminate(msg) => {
                tracing::error!("Authorization indeterminate: {}", msg);
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::InvalidTransition { .. } | AppError::ConcurrentModification(_) => {
                StatusCode::CONFLICT
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::CascadeIncomplete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            AppError::Database(_) => "Database error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            kind: self.kind(),
            field: self.field().map(str::to_string),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
