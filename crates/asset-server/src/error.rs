//! Error types for the asset server

use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// Startup and configuration failures
#[derive(Debug)]
pub enum ServiceError {
    Io(Box<std::io::Error>),
    Config(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Io(err) => write!(f, "IO error: {}", err),
            ServiceError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServiceError::Io(err) => Some(err.as_ref()),
            ServiceError::Config(_) => None,
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Io(Box::new(err))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Config(format!("invalid database settings: {}", err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for ServiceError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        ServiceError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Request failure that converts to an HTTP response
///
/// `InvalidInput` and `NotFound` carry the client-facing message. The other
/// variants carry diagnostic detail that only leaves the process in
/// development mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    InvalidInput(String),
    NotFound(String),
    InvalidData(String),
    ServiceUnavailable(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::InvalidData(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error, including diagnostic detail when `expose_details` is set
    pub fn into_response_with(self, expose_details: bool) -> Response {
        let status = self.status();
        let body = match self {
            AppError::InvalidInput(msg) | AppError::NotFound(msg) => ErrorBody {
                error: msg,
                details: None,
            },
            AppError::InvalidData(detail) => {
                tracing::warn!(error = %detail, "Unusable asset record");
                ErrorBody {
                    error: "Invalid asset data".into(),
                    details: expose_details.then_some(detail),
                }
            }
            AppError::ServiceUnavailable(detail) => {
                tracing::error!(error = %detail, "Asset store unavailable");
                ErrorBody {
                    error: "Database unavailable".into(),
                    details: expose_details.then_some(detail),
                }
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal server error");
                ErrorBody {
                    error: "Internal server error".into(),
                    details: expose_details.then_some(detail),
                }
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            AppError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => AppError::ServiceUnavailable(msg),
            StoreError::Query(msg) => AppError::Internal(msg),
        }
    }
}
