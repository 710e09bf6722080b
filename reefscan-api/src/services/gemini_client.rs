//! Gemini `generateContent` client
//!
//! One request per image. Uploads travel inline (base64), remote images are
//! referenced by URL inside the prompt. The reply text goes through
//! [`reply_parser`](super::reply_parser); a reply that yields no detections
//! is logged with its raw text and treated as an empty list.

use async_trait::async_trait;
use base64::Engine;
use reefscan_common::DetectionList;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::classifier::{ClassifierError, ExternalClassifier};
use super::reply_parser::parse_detections;
use crate::models::ImageInput;

const USER_AGENT: &str = concat!("reefscan/", env!("CARGO_PKG_VERSION"));
const API_KEY_HEADER: &str = "x-goog-api-key";
/// Upstream error bodies are cut to this many characters before logging
const MAX_ERROR_BODY_CHARS: usize = 512;

pub const DETECTION_PROMPT: &str = "Identify the marine species in this image and count the \
individuals of each species. Respond strictly with a JSON array and nothing else, in the \
format: [{\"species\":\"plankton\",\"count\":12}]. Respond with [] if no organisms are visible.";

/// Connection settings for [`GeminiClassifier`]
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    /// Scheme + host, e.g. `https://generativelanguage.googleapis.com`
    pub base_url: String,
    pub timeout: Duration,
}

// ----------------------------------------------------------------------------
// Wire types
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestContent {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "inline_data", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InlineData {
    pub mime_type: String,
    /// Base64 (standard alphabet, padded)
    pub data: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    #[serde(default)]
    pub text: Option<String>,
}

impl GenerateContentRequest {
    /// Prompt plus image for one classification
    pub fn for_image(image: &ImageInput) -> Self {
        let parts = match image {
            ImageInput::Remote { url } => vec![RequestPart {
                text: Some(format!("Image URL: {}\n\n{}", url, DETECTION_PROMPT)),
                inline_data: None,
            }],
            ImageInput::Inline {
                media_type, bytes, ..
            } => vec![
                RequestPart {
                    text: Some(DETECTION_PROMPT.to_string()),
                    inline_data: None,
                },
                RequestPart {
                    text: None,
                    inline_data: Some(InlineData {
                        mime_type: media_type.clone(),
                        data: base64::engine::general_purpose::STANDARD.encode(bytes),
                    }),
                },
            ],
        };

        Self {
            contents: vec![RequestContent {
                role: "user".to_string(),
                parts,
            }],
        }
    }
}

impl GenerateContentResponse {
    /// Text parts of the first candidate, concatenated
    pub fn reply_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

// ----------------------------------------------------------------------------
// Client
// ----------------------------------------------------------------------------

/// Gemini-backed [`ExternalClassifier`]
pub struct GeminiClassifier {
    http_client: reqwest::Client,
    settings: GeminiSettings,
}

impl GeminiClassifier {
    pub fn new(settings: GeminiSettings) -> Result<Self, ClassifierError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| ClassifierError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            settings,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> ClassifierError {
        if e.is_timeout() {
            ClassifierError::Timeout(self.settings.timeout.as_secs())
        } else {
            ClassifierError::Network(e.to_string())
        }
    }

    /// Issue the request and return the raw reply text ("" when the reply
    /// carries no text part)
    pub async fn generate(&self, image: &ImageInput) -> Result<String, ClassifierError> {
        let body = GenerateContentRequest::for_image(image);

        debug!(
            model = %self.settings.model,
            image = %image.describe(),
            "Querying Gemini generateContent"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();

        if status == 401 || status == 403 {
            return Err(ClassifierError::Unauthorized(status.as_u16()));
        }

        if !status.is_success() {
            let error_text: String = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(ClassifierError::Api(status.as_u16(), error_text));
        }

        let envelope: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClassifierError::Timeout(self.settings.timeout.as_secs())
            } else {
                ClassifierError::Decode(e.to_string())
            }
        })?;

        Ok(envelope.reply_text().unwrap_or_default())
    }
}

#[async_trait]
impl ExternalClassifier for GeminiClassifier {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn classify(&self, image: &ImageInput) -> Result<DetectionList, ClassifierError> {
        let raw_reply = self.generate(image).await?;

        match parse_detections(&raw_reply) {
            Ok(detections) => {
                info!(
                    model = %self.settings.model,
                    detections = detections.len(),
                    "Gemini classification parsed"
                );
                Ok(detections)
            }
            Err(e) => {
                warn!(
                    reason = %e,
                    raw_reply = %raw_reply,
                    "Could not parse Gemini reply, using [] instead"
                );
                Ok(DetectionList::new())
            }
        }
    }
}
