//! Input validation for the Surge API
//!
//! `ValidatedJson<T>` is an Axum extractor that deserializes and validates
//! request bodies before they reach a handler.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Request body size limit: 64KB
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Error type for validated JSON extraction
#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": self.message,
            "error_type": "validation_error"
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

/// A JSON extractor that validates the request body using the validator crate
///
/// Usage:
/// ```ignore
/// async fn handler(ValidatedJson(payload): ValidatedJson<MyRequest>) -> impl IntoResponse {
///     // payload is guaranteed to be valid
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ValidationError {
                message: format!("Invalid JSON: {}", rejection),
            })?;

        value.validate().map_err(|e| ValidationError {
            message: format!("Validation failed: {}", e),
        })?;

        Ok(ValidatedJson(value))
    }
}
