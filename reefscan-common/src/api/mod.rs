//! API module for shared HTTP request/response types
//!
//! Contains ONLY framework-independent types. Services wrap these with their
//! own HTTP layer (Axum).

pub mod types;

pub use types::{
    AnalysisResult, DetectionOrigin, ImageUrlRequest, MessageResponse, ResultCreatedResponse,
};
