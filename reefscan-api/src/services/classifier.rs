//! External classification seam

use async_trait::async_trait;
use reefscan_common::DetectionList;
use thiserror::Error;

use crate::models::ImageInput;

/// Failures talking to the external classifier
///
/// An unparsable reply is NOT an error: implementations degrade to an
/// empty list instead.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("API key rejected ({0})")]
    Unauthorized(u16),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Undecodable response envelope: {0}")]
    Decode(String),
}

/// Asks a third-party model which species are in an image
#[async_trait]
pub trait ExternalClassifier: Send + Sync {
    /// Identifier for logs
    fn name(&self) -> &'static str;

    /// Exactly one outbound request per call
    async fn classify(&self, image: &ImageInput) -> Result<DetectionList, ClassifierError>;
}
