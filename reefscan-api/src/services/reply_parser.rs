//! Free-text reply → DetectionList extraction
//!
//! Generative models are asked for a bare JSON array but do not always
//! comply. Fallback order:
//! 1. First fenced code block (```` ```json ... ``` ````) whose body parses
//! 2. The whole reply parsed as JSON
//! 3. The outermost `[` … `]` span
//!
//! Anything else is a [`ReplyParseError`]. Pure: no logging, no I/O.

use once_cell::sync::Lazy;
use regex::Regex;
use reefscan_common::DetectionList;
use serde::Deserialize;
use thiserror::Error;

static FENCED_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)```").unwrap());

/// Reply could not be turned into detections
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplyParseError {
    #[error("reply is empty")]
    Empty,

    #[error("no detection array found in reply")]
    NoDetections,
}

/// Accepted payload shapes: a bare array, or `{ "detections": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Bare(DetectionList),
    Wrapped { detections: DetectionList },
}

impl From<Payload> for DetectionList {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Bare(list) => list,
            Payload::Wrapped { detections } => detections,
        }
    }
}

fn try_parse(candidate: &str) -> Option<DetectionList> {
    serde_json::from_str::<Payload>(candidate.trim())
        .ok()
        .map(DetectionList::from)
}

fn fenced_blocks(text: &str) -> impl Iterator<Item = &str> {
    FENCED_BLOCK_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn bracket_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (start < end).then(|| &text[start..=end])
}

/// Extract a detection list from a model reply
pub fn parse_detections(text: &str) -> Result<DetectionList, ReplyParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ReplyParseError::Empty);
    }

    if let Some(list) = fenced_blocks(trimmed).find_map(try_parse) {
        return Ok(list);
    }

    if let Some(list) = try_parse(trimmed) {
        return Ok(list);
    }

    bracket_span(trimmed)
        .and_then(try_parse)
        .ok_or(ReplyParseError::NoDetections)
}

/// [`parse_detections`], with any failure mapped to an empty list
pub fn parse_detections_or_empty(text: &str) -> DetectionList {
    parse_detections(text).unwrap_or_default()
}
