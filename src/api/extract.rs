//! Request body extractors rejecting with the crate error body

use axum::{body::Bytes, extract::FromRequest};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// JSON request body; malformed input is a `validation_failure`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// JSON body that may be left out entirely; only an empty body means default
pub(crate) fn optional_json<T>(body: &Bytes) -> AppResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}
