//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors returned by the API handlers
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed upload or disallowed file
    #[error("{0}")]
    InvalidRequest(String),

    /// Well-formed request that fails validation
    #[error("{0}")]
    Unprocessable(String),

    /// The engine failed unexpectedly
    #[error("analysis failed: {0}")]
    Analysis(#[from] provenant_core::Error),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Unprocessable(_) => "validation",
            AppError::Analysis(_) => "analysis",
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::InvalidRequest(err.body_text())
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Unprocessable(err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        metrics::counter!("provenant_errors_total", "kind" => self.kind()).increment(1);

        let (status, error, detail) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid request", msg),
            AppError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation failed", msg)
            }
            AppError::Analysis(err) => {
                tracing::error!(error = %err, "Analysis failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "analysis failed", err.to_string())
            }
        };

        let body = json!({
            "error": error,
            "detail": detail,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::InvalidRequest("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::Unprocessable("short".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                AppError::Analysis(provenant_core::Error::internal("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
