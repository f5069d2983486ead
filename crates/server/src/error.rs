//! Unified error handling for the server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::shopify::FeedError;
use crate::sync::SyncError;

/// Application-level error type for the JSON API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Directory API operation failed.
    #[error("Directory error: {0}")]
    Feed(#[from] FeedError),

    /// Reconciliation could not run.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body, matching what API clients expect.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server-side errors with Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Feed(_) | Self::Sync(SyncError::Source(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_))
            | Self::Sync(SyncError::AlreadyRunning) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Feed(_) | Self::Sync(SyncError::Source(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(reason)) => format!("Conflict: {reason}"),
            Self::Database(_) => "Internal server error".to_string(),
            Self::Feed(_) | Self::Sync(SyncError::Source(_)) => {
                "External directory unavailable".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
