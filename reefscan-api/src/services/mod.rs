//! Detection reconciliation services

pub mod analysis;
pub mod classifier;
pub mod detection_source;
pub mod gemini_client;
pub mod reconciler;
pub mod reply_parser;
pub mod result_store;

pub use analysis::AnalysisService;
pub use classifier::{ClassifierError, ExternalClassifier};
pub use detection_source::{
    DetectionSource, DetectionSourceError, HttpDetectionSource, StaticDetectionSource,
};
pub use gemini_client::{GeminiClassifier, GeminiSettings};
pub use reconciler::{reconcile, Reconciliation};
pub use reply_parser::{parse_detections, parse_detections_or_empty, ReplyParseError};
pub use result_store::{InMemoryResultStore, NewAnalysisResult, ResultStore};
