use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Service-wide error type.
/// Handlers return `Result<T, AppError>`; the `IntoResponse` impl renders the JSON envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage or network failure during a write. Prior state is left as it was.
    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The external insight service failed or returned an unusable payload.
    #[error("Insight generation failed: {0}")]
    Insight(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Short machine-readable code used in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Transient(_) | AppError::Database(_) | AppError::S3(_) => "TRANSIENT_ERROR",
            AppError::Insight(_) => "INSIGHT_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Transient(_) | AppError::Database(_) | AppError::S3(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Insight(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match &self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Transient(msg) => {
                tracing::warn!("Transient failure: {msg}");
                "The operation could not be completed; re-fetch and try again".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                "A storage error occurred; re-fetch and try again".to_string()
            }
            AppError::Insight(msg) => {
                tracing::warn!("Insight error: {msg}");
                "The insight service could not analyze this objective".to_string()
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                "A storage error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::Validation("rating must be between 1 and 5".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_storage_failures_are_transient() {
        assert_eq!(
            AppError::Database(sqlx::Error::PoolTimedOut).code(),
            "TRANSIENT_ERROR"
        );
        assert_eq!(
            AppError::Transient("connection reset".to_string()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = AppError::NotFound("Objective x not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
