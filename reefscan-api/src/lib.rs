//! reefscan-api library interface
//!
//! Detection reconciliation service: one image in, baseline and external
//! detections reconciled, one recorded result out.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    response::{IntoResponse, Response},
    Router,
};
use chrono::{DateTime, Utc};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::{ServiceConfig, UploadLimits};
use crate::services::{
    AnalysisService, DetectionSource, GeminiClassifier, GeminiSettings, HttpDetectionSource,
    InMemoryResultStore, StaticDetectionSource,
};

/// Headroom over `max_upload_bytes` for multipart framing and form fields
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub analysis: Arc<AnalysisService>,
    pub limits: Arc<UploadLimits>,
    /// Allowed cross-origin client; any origin when `None`
    pub client_origin: Option<String>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(analysis: AnalysisService, limits: UploadLimits) -> Self {
        Self {
            analysis: Arc::new(analysis),
            limits: Arc::new(limits),
            client_origin: None,
            startup_time: Utc::now(),
        }
    }

    pub fn with_client_origin(mut self, client_origin: Option<String>) -> Self {
        self.client_origin = client_origin;
        self
    }

    /// Wire the production services from resolved configuration
    ///
    /// Loads the static dataset once (unless a live detection endpoint is
    /// configured) and starts with an empty in-memory result store.
    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let baseline: Arc<dyn DetectionSource> = match &config.detection_api_url {
            Some(url) => {
                info!("Baseline detections from live endpoint {}", url);
                Arc::new(HttpDetectionSource::new(url.clone(), config.upstream_timeout)?)
            }
            None => Arc::new(StaticDetectionSource::from_file(&config.detections_path)?),
        };

        let classifier = Arc::new(GeminiClassifier::new(GeminiSettings {
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
            timeout: config.upstream_timeout,
        })?);

        let store = Arc::new(InMemoryResultStore::new());

        Ok(Self::new(
            AnalysisService::new(baseline, classifier, store),
            config.limits.clone(),
        )
        .with_client_origin(config.client_origin.clone()))
    }
}

/// CORS policy: the configured client origin, or any origin
pub fn cors_layer(client_origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(AnyOrigin).allow_headers(AnyOrigin);

    match client_origin {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => base.allow_origin(value),
            Err(e) => {
                warn!("Invalid client origin {:?} ({}), allowing any origin", origin, e);
                base.allow_origin(AnyOrigin)
            }
        },
        None => base.allow_origin(AnyOrigin),
    }
}

/// Panics inside handlers become the generic 500 body
fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!("Handler panicked: {}", detail);

    ApiError::Internal("handler panicked".to_string()).into_response()
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .limits
        .max_upload_bytes
        .saturating_add(BODY_LIMIT_OVERHEAD);
    let cors = cors_layer(state.client_origin.as_deref());

    Router::new()
        .merge(api::health_routes())
        .merge(api::results_routes())
        .fallback(api::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
