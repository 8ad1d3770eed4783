//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use surge_core::SurgeError;

/// Error returned by API handlers.
///
/// Invalid input maps to 422; model and prediction failures map to 500 and
/// leave the daemon serving.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ApiError(#[from] pub SurgeError);

impl ApiError {
    fn status(&self) -> StatusCode {
        if self.0.is_invalid_input() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let e = &self.0;
        let body = serde_json::json!({
            "success": false,
            "error": e.to_string(),
            "error_type": e.kind(),
            "hint": e.remediation()
        });
        (self.status(), Json(body)).into_response()
    }
}
