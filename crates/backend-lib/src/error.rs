// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::validation::ValidationError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Template error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Timed out: {0}")]
    Timeout(&'static str),

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::SEE_OTHER,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "AUTH_001",
            AppError::AuthRateLimited => "AUTH_003",
            AppError::Internal(_) => "INT_001",
            AppError::Timeout(_) => "INT_002",
            AppError::Render(_) => "INT_003",
            AppError::NotFound(_) => "NF_001",
            AppError::Conflict(_) => "CONFLICT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
            AppError::Database(_) => "DB_001",
            AppError::Validation(_) => "VAL_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Unauthenticated => "Authentication required".to_string(),
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::NotFound(_) => "Resource not found".to_string(),
            AppError::Conflict(_) => "Resource already exists".to_string(),
            AppError::Validation(_) => "Invalid input provided".to_string(),
            _ => "An internal server error occurred".to_string(),
        }
    }

    /// Whether this is a server-side failure rather than a problem with the request
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Unauthenticated) {
            return Redirect::to("/login").into_response();
        }

        let status = self.status_code();
        let error_code = self.error_code();

        // Server-side detail stays in the log
        let message = if self.is_internal() {
            tracing::error!(code = error_code, error = %self, "request failed");
            self.sanitized_message()
        } else {
            self.to_string()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background task failed: {err}"))
    }
}
