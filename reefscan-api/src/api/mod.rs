//! HTTP API handlers for reefscan-api

pub mod health;
pub mod intake;
pub mod results;

pub use health::health_routes;
pub use intake::ImageUpload;
pub use results::results_routes;

use crate::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
