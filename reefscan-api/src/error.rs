//! Error types for reefscan-api
//!
//! Every error response is `{ "message": ... }`. Client errors (4xx) carry a
//! human-readable reason; server errors (5xx) always say
//! "Internal Server Error" and the detail only goes to the log.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use reefscan_common::api::MessageResponse;
use thiserror::Error;
use tracing::error;

use crate::services::{ClassifierError, DetectionSourceError};

/// Body text of every 5xx response
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal Server Error";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed image (400)
    #[error("{0}")]
    BadRequest(String),

    /// Upload over the configured size limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Media type outside the configured allow-list (415)
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// Route does not exist (404)
    #[error("Not Found")]
    NotFound,

    /// External classifier or live detection endpoint failed (500)
    #[error("Upstream call failed: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// reefscan-common error
    #[error("Common error: {0}")]
    Common(#[from] reefscan_common::Error),
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        ApiError::Upstream(format!("external classifier: {}", err))
    }
}

impl From<DetectionSourceError> for ApiError {
    fn from(err: DetectionSourceError) -> Self {
        match err {
            DetectionSourceError::Network(_) | DetectionSourceError::Api(..) => {
                ApiError::Upstream(format!("detection source: {}", err))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Upstream(_)
            | ApiError::Internal(_)
            | ApiError::Other(_)
            | ApiError::Common(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            INTERNAL_SERVER_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
