//! Submitted image, as handed from request intake to the detection sources

use axum::body::Bytes;

/// One image per request: either a remote reference or uploaded bytes
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// `{ "imageUrl": ... }` submissions
    Remote { url: String },
    /// Multipart uploads; `media_type` is already validated
    Inline {
        media_type: String,
        bytes: Bytes,
        file_name: Option<String>,
    },
}

impl ImageInput {
    pub fn remote(url: impl Into<String>) -> Self {
        ImageInput::Remote { url: url.into() }
    }

    pub fn inline(media_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        ImageInput::Inline {
            media_type: media_type.into(),
            bytes: bytes.into(),
            file_name: None,
        }
    }

    /// URL for remote submissions, `None` for uploads
    pub fn image_url(&self) -> Option<&str> {
        match self {
            ImageInput::Remote { url } => Some(url),
            ImageInput::Inline { .. } => None,
        }
    }

    /// Short description for log lines (never the payload itself)
    pub fn describe(&self) -> String {
        match self {
            ImageInput::Remote { url } => format!("url {}", url),
            ImageInput::Inline {
                media_type,
                bytes,
                file_name,
            } => format!(
                "upload {} ({}, {} bytes)",
                file_name.as_deref().unwrap_or("<unnamed>"),
                media_type,
                bytes.len()
            ),
        }
    }
}
