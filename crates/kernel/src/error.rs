//! Application error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::search::SearchError;

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("{0}")]
    BadRequest(String),

    /// The backing store is not reachable.
    #[error("{0}")]
    Unavailable(String),

    /// Query execution failed; carries the store's message.
    #[error("{0}")]
    Query(String),
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::NoTable => AppError::BadRequest(err.to_string()),
            SearchError::StoreUnavailable => AppError::Unavailable(err.to_string()),
            SearchError::Store(e) => AppError::Query(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        match &self {
            AppError::Internal(e) => tracing::error!(error = %e, "internal server error"),
            AppError::Query(e) => tracing::error!(error = %e, "query failed"),
            AppError::Unavailable(e) => tracing::warn!(error = %e, "store unavailable"),
            AppError::BadRequest(_) => {}
        }

        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;
