//! Shared API request/response types
//!
//! Wire format uses camelCase keys, matching what the capture client sends
//! and expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::DetectionList;

// ========================================
// Analysis Results
// ========================================

/// Which detection list was chosen as canonical for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectionOrigin {
    /// Baseline and external lists agreed
    LocalModel,
    /// Lists disagreed; the external reading was taken
    ExternalAi,
}

impl DetectionOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionOrigin::LocalModel => "local-model",
            DetectionOrigin::ExternalAi => "external-ai",
        }
    }
}

impl std::fmt::Display for DetectionOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One processed request. Immutable once recorded.
///
/// # Examples
///
/// ```
/// use reefscan_common::api::types::{AnalysisResult, DetectionOrigin};
/// use reefscan_common::Detection;
///
/// let result = AnalysisResult {
///     id: 1,
///     image_url: None,
///     local_detections: vec![Detection::new("copepod", 3)],
///     external_detections: vec![Detection::new("copepod", 3)],
///     final_detections: vec![Detection::new("copepod", 3)],
///     source: DetectionOrigin::LocalModel,
///     timestamp: chrono::Utc::now(),
/// };
/// let json = serde_json::to_value(&result).unwrap();
/// assert_eq!(json["source"], "local-model");
/// assert!(json.get("imageUrl").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Sequential id assigned by the result store (1-based)
    pub id: u64,

    /// Submitted image URL, for URL-based requests only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    pub local_detections: DetectionList,
    pub external_detections: DetectionList,
    pub final_detections: DetectionList,
    pub source: DetectionOrigin,
    pub timestamp: DateTime<Utc>,
}

// ========================================
// Requests / Responses
// ========================================

/// JSON variant of `POST /api/results`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrlRequest {
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Body of `201 Created` from `POST /api/results`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultCreatedResponse {
    pub message: String,
    pub data: AnalysisResult,
}

/// Body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
