//! Access Resolution Error Types

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::ErrorResponse;

/// Failures while resolving the authorized channel set.
///
/// Every variant is a server-side failure: the request must not be forwarded
/// with an unenforced channel list.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Query against the store failed.
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    /// Store did not answer within the configured bound.
    #[error("Channel store timed out after {0:?}")]
    Timeout(Duration),

    /// Store is unavailable for a reason other than a query error.
    #[error("Channel store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for access resolution.
pub type AccessResult<T> = Result<T, AccessError>;

impl IntoResponse for AccessError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: "CHANNEL_RESOLUTION_FAILED".to_string(),
            message: "Internal server error while filtering sales channels".to_string(),
        });

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
