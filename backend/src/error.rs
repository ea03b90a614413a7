//! Error handling for the DustReports server
//!
//! Report outcomes that are not failures ("nothing loaded yet", "filters
//! matched nothing") live in [`ReportError`]; the HTTP layer folds everything
//! into [`AppError`] and renders a consistent JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::snapshot::LoadError;

/// Non-exceptional "no data" signals produced by the report engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The snapshot store has never been loaded
    #[error("No data loaded. Please load dataframes first.")]
    NoDataLoaded,

    /// The snapshot is loaded but the filters exclude everything
    #[error("No data found for the specified criteria: {0}")]
    NoMatchingRows(String),
}

impl ReportError {
    pub fn no_match(reason: impl Into<String>) -> Self {
        ReportError::NoMatchingRows(reason.into())
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Report(#[from] ReportError),

    // Snapshot refresh errors
    #[error("Snapshot refresh failed: {0}")]
    Refresh(#[from] LoadError),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Report(ReportError::NoDataLoaded) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "NO_DATA_LOADED".to_string(),
                    message: self.to_string(),
                    field: None,
                },
            ),
            AppError::Report(ReportError::NoMatchingRows(_)) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NO_MATCHING_ROWS".to_string(),
                    message: self.to_string(),
                    field: None,
                },
            ),
            AppError::Refresh(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "REFRESH_FAILED".to_string(),
                    message: self.to_string(),
                    field: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
        };

        // "No data" outcomes are expected; only log real failures as errors
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for report computations
pub type ReportResult<T> = Result<T, ReportError>;
