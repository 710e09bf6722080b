//! Test helper utilities
//!
//! Shared utilities for testing reefscan-api

#![allow(dead_code, unused_imports)]

pub mod log_capture;
pub mod mock_detection;
pub mod mock_gemini;

pub use log_capture::LogCapture;
pub use mock_detection::MockDetectionApi;
pub use mock_gemini::{MockGemini, MockReply};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use reefscan_api::config::UploadLimits;
use reefscan_api::models::ImageInput;
use reefscan_api::services::{
    AnalysisService, ClassifierError, ExternalClassifier, InMemoryResultStore,
    StaticDetectionSource,
};
use reefscan_api::{build_router, AppState};
use reefscan_common::{Detection, DetectionList};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];
pub const MULTIPART_BOUNDARY: &str = "reefscan-test-boundary";

/// Baseline used by every test app
pub fn baseline() -> DetectionList {
    vec![Detection::new("copepod", 3)]
}

/// Classifier returning a fixed list
pub struct FixedClassifier(pub DetectionList);

#[async_trait]
impl ExternalClassifier for FixedClassifier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn classify(&self, _image: &ImageInput) -> Result<DetectionList, ClassifierError> {
        Ok(self.0.clone())
    }
}

/// Classifier that always fails like an unreachable upstream
pub struct FailingClassifier;

#[async_trait]
impl ExternalClassifier for FailingClassifier {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn classify(&self, _image: &ImageInput) -> Result<DetectionList, ClassifierError> {
        Err(ClassifierError::Unauthorized(403))
    }
}

/// Classifier that panics mid-request
pub struct PanickingClassifier;

#[async_trait]
impl ExternalClassifier for PanickingClassifier {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn classify(&self, _image: &ImageInput) -> Result<DetectionList, ClassifierError> {
        panic!("classifier exploded")
    }
}

pub fn test_app(classifier: Arc<dyn ExternalClassifier>) -> Router {
    test_app_with_limits(classifier, UploadLimits::default())
}

pub fn test_app_with_limits(classifier: Arc<dyn ExternalClassifier>, limits: UploadLimits) -> Router {
    let analysis = AnalysisService::new(
        Arc::new(StaticDetectionSource::new(baseline())),
        classifier,
        Arc::new(InMemoryResultStore::new()),
    );
    build_router(AppState::new(analysis, limits))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Single-part multipart body
pub fn post_multipart(
    uri: &str,
    field: &str,
    file_name: Option<&str>,
    content_type: Option<&str>,
    data: &[u8],
) -> Request<Body> {
    let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", field);
    if let Some(name) = file_name {
        disposition.push_str(&format!("; filename=\"{}\"", name));
    }

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n{}\r\n", MULTIPART_BOUNDARY, disposition).as_bytes());
    if let Some(ct) = content_type {
        body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
    }
    body.extend_from_slice(b"\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Send a request; returns status and raw body bytes
pub async fn send_raw(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

/// Send a request; returns status and JSON body
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(app, request).await;
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
