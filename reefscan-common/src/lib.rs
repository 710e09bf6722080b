//! # reefscan Common Library
//!
//! Shared code for the reefscan services including:
//! - Detection types and canonical ordering
//! - API request/response types
//! - Bootstrap configuration loading

pub mod api;
pub mod config;
pub mod detection;
pub mod error;

pub use detection::{Detection, DetectionList};
pub use error::{Error, Result};
