//! Application error types for the backend host.
//!
//! Provides a unified error type that implements `IntoResponse` for Axum.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use spa_frontend::FrontendError;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration loading/parsing errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration that parsed but makes no sense
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Frontend setup or dev server lifecycle errors
    #[error("Frontend error: {0}")]
    Frontend(#[from] FrontendError),

    /// Listener and socket errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Frontend(FrontendError::DevServerAlreadyRunning) => (
                StatusCode::CONFLICT,
                "dev_server_running",
                Some(self.to_string()),
            ),
            AppError::Frontend(FrontendError::ReleaseMode) => (
                StatusCode::CONFLICT,
                "release_mode",
                Some(self.to_string()),
            ),
            AppError::Frontend(FrontendError::DevServerNotRunning) => (
                StatusCode::CONFLICT,
                "dev_server_stopped",
                Some(self.to_string()),
            ),
            AppError::Frontend(e) => {
                tracing::error!(error = %e, "Frontend error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "frontend_error",
                    Some(e.to_string()),
                )
            }
            AppError::Config(_) | AppError::InvalidConfig(_) | AppError::Io(_) => {
                tracing::error!(error = %self, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_server_conflicts() {
        let response = AppError::from(FrontendError::DevServerAlreadyRunning).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::from(FrontendError::DevServerNotRunning).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::from(FrontendError::ReleaseMode).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_other_errors_are_internal() {
        let response =
            AppError::from(FrontendError::DevServerStart("exit status: 1".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::InvalidConfig("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
