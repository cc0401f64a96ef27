use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use taskgenie_errors::TaskGenieError;

use crate::response::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] TaskGenieError),

    /// Malformed request shape (bad JSON, unparseable query parameter).
    #[error("{0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match &self {
            ApiError::Core(TaskGenieError::TaskNotFound { .. }) => {
                (StatusCode::NOT_FOUND, self.to_string(), "TASK_NOT_FOUND")
            }
            ApiError::Core(TaskGenieError::Validation(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                self.to_string(),
                "VALIDATION_ERROR",
            ),
            ApiError::BadRequest(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                message.clone(),
                "VALIDATION_ERROR",
            ),
            ApiError::Core(err) => {
                // Store faults and the like: log the cause, hide the detail.
                tracing::error!(error = %err, "Request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    err.code(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
