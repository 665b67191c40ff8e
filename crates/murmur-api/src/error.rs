//! Murmur API — error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use murmur_core::error::NotifyError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `NotifyError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub NotifyError);

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            NotifyError::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            NotifyError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired"),
            NotifyError::TokenInvalid => (StatusCode::UNAUTHORIZED, "token_invalid"),
            NotifyError::TooManySubscriptions { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "too_many_subscriptions")
            }
            NotifyError::BusClosed => (StatusCode::SERVICE_UNAVAILABLE, "shutting_down"),
            NotifyError::RelayPublishFailed(_) => (StatusCode::BAD_GATEWAY, "relay_publish_failed"),
            NotifyError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
