use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;
use crate::validation::ValidationError;

/// Boundary mapping of every failure path to a caller-distinguishable
/// outcome: fix your input (400), the thing doesn't exist (404), or an
/// infrastructure problem (500).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound,

    #[error("store failure")]
    Store(#[source] sqlx::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            // Caller-correctable, so it surfaces in the validation shape
            StoreError::InvalidInterval => ApiError::Validation(ValidationError::single(
                "end",
                "end must be greater than start",
            )),
            StoreError::Database(e) => ApiError::Store(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "Validation failed",
                    "details": err.violations,
                })),
            )
                .into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Not found" })),
            )
                .into_response(),
            ApiError::Store(e) => {
                tracing::error!("store failure: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}
