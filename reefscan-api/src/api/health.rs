//! Liveness endpoints

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::error::ApiResult;
use crate::AppState;

pub const LIVENESS_TEXT: &str = "Marine biodiversity backend is running...";

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status ("ok")
    pub status: String,
    /// Module name ("reefscan-api")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    pub results_recorded: usize,
}

/// GET /
///
/// Plain-text liveness string
pub async fn root() -> &'static str {
    LIVENESS_TEXT
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        module: "reefscan-api".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime.num_seconds().max(0) as u64,
        results_recorded: state.analysis.results_recorded().await?,
    }))
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
}
