//! Baseline detection sources
//!
//! The baseline is a canned dataset loaded once at startup
//! ([`StaticDetectionSource`]); it returns the same list for every image.
//! [`HttpDetectionSource`] posts the image to a live detection endpoint and
//! is only wired in when one is configured.

use async_trait::async_trait;
use reefscan_common::DetectionList;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::ImageInput;

/// Baseline detection errors
#[derive(Debug, Error)]
pub enum DetectionSourceError {
    #[error("Cannot read detection dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid detection dataset: {0}")]
    Dataset(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Detection API error {0}: {1}")]
    Api(u16, String),
}

/// Something that produces the baseline detections for an image
#[async_trait]
pub trait DetectionSource: Send + Sync {
    /// Identifier for logs ("static", "http")
    fn name(&self) -> &'static str;

    async fn detect(&self, image: &ImageInput) -> Result<DetectionList, DetectionSourceError>;
}

/// Dataset file shapes: `{ "detections": [...] }` or a bare array.
/// A wrapper without `detections` means no detections.
#[derive(Deserialize)]
#[serde(untagged)]
enum DetectionPayload {
    Bare(DetectionList),
    Wrapped {
        #[serde(default)]
        detections: DetectionList,
    },
}

impl From<DetectionPayload> for DetectionList {
    fn from(payload: DetectionPayload) -> Self {
        match payload {
            DetectionPayload::Bare(list) => list,
            DetectionPayload::Wrapped { detections } => detections,
        }
    }
}

// ============================================================================
// Static dataset
// ============================================================================

/// Canned detections, identical for every request
#[derive(Debug, Clone)]
pub struct StaticDetectionSource {
    detections: DetectionList,
}

impl StaticDetectionSource {
    pub fn new(detections: DetectionList) -> Self {
        Self { detections }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DetectionSourceError> {
        let payload: DetectionPayload = serde_json::from_str(json)
            .map_err(|e| DetectionSourceError::Dataset(e.to_string()))?;
        Ok(Self::new(payload.into()))
    }

    /// Load the packaged dataset (called once at startup)
    pub fn from_file(path: &Path) -> Result<Self, DetectionSourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| DetectionSourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let source = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            detections = source.detections.len(),
            "Loaded static detection dataset"
        );
        Ok(source)
    }

    pub fn detections(&self) -> &DetectionList {
        &self.detections
    }
}

#[async_trait]
impl DetectionSource for StaticDetectionSource {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn detect(&self, _image: &ImageInput) -> Result<DetectionList, DetectionSourceError> {
        Ok(self.detections.clone())
    }
}

// ============================================================================
// Live endpoint
// ============================================================================

/// Detection endpoint client
///
/// Remote images are sent as `{ "imageUrl": ... }`, uploads as a multipart
/// `file` part. The reply's `detections` field is read; absent means `[]`.
pub struct HttpDetectionSource {
    http_client: reqwest::Client,
    url: String,
}

impl HttpDetectionSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DetectionSourceError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DetectionSourceError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DetectionSource for HttpDetectionSource {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn detect(&self, image: &ImageInput) -> Result<DetectionList, DetectionSourceError> {
        let request = match image {
            ImageInput::Remote { url } => self
                .http_client
                .post(&self.url)
                .json(&serde_json::json!({ "imageUrl": url })),
            ImageInput::Inline {
                media_type,
                bytes,
                file_name,
            } => {
                let part = reqwest::multipart::Part::bytes(bytes.to_vec())
                    .file_name(file_name.clone().unwrap_or_else(|| "upload".to_string()))
                    .mime_str(media_type)
                    .map_err(|e| DetectionSourceError::Network(e.to_string()))?;
                self.http_client
                    .post(&self.url)
                    .multipart(reqwest::multipart::Form::new().part("file", part))
            }
        };

        debug!(url = %self.url, image = %image.describe(), "Querying detection API");

        let response = request
            .send()
            .await
            .map_err(|e| DetectionSourceError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(DetectionSourceError::Api(status.as_u16(), error_text));
        }

        let payload: DetectionPayload = response
            .json()
            .await
            .map_err(|e| DetectionSourceError::Dataset(e.to_string()))?;

        Ok(payload.into())
    }
}
