//! Error envelope for the HTTP boundary

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use staydesk_core::Error;
use thiserror::Error;
use tracing::error;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Error raised by the booking workflow or the store
    #[error(transparent)]
    Core(#[from] Error),

    /// Body was not JSON or did not match the expected shape
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => match err {
                Error::Conflict { .. } => StatusCode::CONFLICT,
                Error::NotFound { .. } => StatusCode::NOT_FOUND,
                Error::Validation(_)
                | Error::InvalidRange { .. }
                | Error::UnknownReference { .. }
                | Error::Domain(_)
                | Error::InvalidTenant(_)
                | Error::TenantRequired(_)
                | Error::Serialization(_) => StatusCode::BAD_REQUEST,
                Error::Config(_) | Error::Database(_) | Error::Internal(_) | Error::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::InvalidBody(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Label for failure metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Core(err) => err.kind(),
            ApiError::InvalidBody(_) => "invalid_body",
            ApiError::InvalidQuery(_) => "invalid_query",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Core(Error::Conflict { .. }) => json!({
                "error": "Booking conflict",
                "conflict": true,
                "message": self.to_string(),
            }),
            _ if status.is_server_error() => {
                error!(error = %self, "Request failed");
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
