//! Error types and error handling for the application
//!
//! This module defines custom error types that can be converted to HTTP responses.
//! All errors implement `IntoResponse` to provide consistent error formatting.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message returned when a search matches nothing
pub const NO_MATCH_MESSAGE: &str = "No listings found matching your criteria.";

/// Application-level error types
///
/// All errors that can occur in the application are represented by this enum.
/// Each variant implements automatic conversion to HTTP responses via `IntoResponse`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Required input is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// Listing with the given ID was not found
    #[error("Listing not found: {0}")]
    NotFound(String),

    /// A search produced zero rows (not a failure, but reported as 404)
    #[error("No listings found matching your criteria.")]
    NoMatch,

    /// Uploaded file has a MIME type outside the image allowlist
    #[error("Invalid file type: {0}. Only JPEG, PNG and GIF are allowed.")]
    InvalidFileType(String),

    /// Uploaded file exceeds the per-file size cap
    #[error("File too large: {name} exceeds the limit of {limit} bytes")]
    FileTooLarge {
        /// Original filename of the rejected upload
        name: String,
        /// Configured size limit in bytes
        limit: usize,
    },

    /// The external completion service failed
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Database failure
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Filesystem failure
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidFileType(_)
            | AppError::FileTooLarge { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::NoMatch => StatusCode::NOT_FOUND,
            AppError::Upstream(_)
            | AppError::Storage(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        // An empty search is reported with a message, not an error
        if let AppError::NoMatch = self {
            return (status, Json(json!({ "message": NO_MATCH_MESSAGE }))).into_response();
        }

        let error_message = match self {
            // Provider details stay in the server log
            AppError::Upstream(_) => "An error occurred while contacting the assistant.".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
