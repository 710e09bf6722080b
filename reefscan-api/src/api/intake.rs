//! Request intake for `POST /api/results`
//!
//! Accepts either
//! - `application/json` `{ "imageUrl": "https://..." }`, or
//! - `multipart/form-data` with the image in a `file` (or `image`) part.
//!   A text part named `imageUrl` is accepted as a URL submission.
//!
//! Uploads are checked against [`UploadLimits`]: size first, then media type.
//! The media type is sniffed from the leading bytes; the declared type never
//! overrides what the bytes say, and bytes that match no known format are
//! rejected.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use reefscan_common::api::ImageUrlRequest;
use tracing::{debug, warn};

use crate::config::UploadLimits;
use crate::error::ApiError;
use crate::models::ImageInput;
use crate::AppState;

pub const MISSING_IMAGE_MESSAGE: &str =
    "Image required: send JSON { \"imageUrl\": ... } or a multipart \"file\" field";

const FILE_FIELDS: &[&str] = &["file", "image"];
const URL_FIELD: &str = "imageUrl";
const OCTET_STREAM: &str = "application/octet-stream";

/// Extractor yielding the validated image of a request
#[derive(Debug)]
pub struct ImageUpload(pub ImageInput);

#[async_trait]
impl FromRequest<AppState> for ImageUpload {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();

        let image = if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            from_multipart(multipart, &state.limits).await?
        } else if content_type.starts_with("application/json") {
            let Json(body) = Json::<ImageUrlRequest>::from_request(req, state)
                .await
                .map_err(|e| {
                    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        ApiError::PayloadTooLarge(e.body_text())
                    } else {
                        debug!("Rejected JSON body: {}", e.body_text());
                        ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string())
                    }
                })?;
            from_image_url(body.image_url)?
        } else {
            return Err(ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string()));
        };

        debug!(image = %image.describe(), "Accepted image");
        Ok(ImageUpload(image))
    }
}

async fn from_multipart(mut multipart: Multipart, limits: &UploadLimits) -> Result<ImageInput, ApiError> {
    let map_field_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(too_large_message(limits))
        } else {
            ApiError::BadRequest(e.body_text())
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(map_field_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if FILE_FIELDS.contains(&name.as_str()) {
            let declared = field.content_type().map(str::to_owned);
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await.map_err(map_field_error)?;

            if bytes.is_empty() {
                continue;
            }

            let media_type = validate_upload(&bytes, declared.as_deref(), limits)?;
            return Ok(ImageInput::Inline {
                media_type,
                bytes,
                file_name,
            });
        }

        if name == URL_FIELD {
            let url = field.text().await.map_err(map_field_error)?;
            return from_image_url(Some(url));
        }
    }

    Err(ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string()))
}

fn from_image_url(image_url: Option<String>) -> Result<ImageInput, ApiError> {
    let url = image_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_IMAGE_MESSAGE.to_string()))?;

    let parsed = reqwest::Url::parse(&url)
        .map_err(|_| ApiError::BadRequest(format!("imageUrl is not a valid URL: {}", url)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::BadRequest(
            "imageUrl must be an http or https URL".to_string(),
        ));
    }

    Ok(ImageInput::remote(url))
}

fn too_large_message(limits: &UploadLimits) -> String {
    format!("Image exceeds the {} byte limit", limits.max_upload_bytes)
}

fn unsupported(media_type: &str, limits: &UploadLimits) -> ApiError {
    ApiError::UnsupportedMediaType(format!(
        "Unsupported media type {} (allowed: {})",
        media_type,
        limits.allowed_media_types.join(", ")
    ))
}

/// `type/subtype`, lowercased, parameters dropped
fn normalize_media_type(declared: &str) -> String {
    declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Check size and format; returns the effective media type
pub fn validate_upload(
    bytes: &Bytes,
    declared: Option<&str>,
    limits: &UploadLimits,
) -> Result<String, ApiError> {
    if bytes.len() > limits.max_upload_bytes {
        return Err(ApiError::PayloadTooLarge(too_large_message(limits)));
    }

    let declared = declared
        .map(normalize_media_type)
        .filter(|t| !t.is_empty() && t != OCTET_STREAM);
    let sniffed = infer::get(bytes).map(|kind| kind.mime_type().to_string());

    let media_type = match (sniffed, declared) {
        (Some(sniffed), Some(declared)) if sniffed != declared => {
            warn!(
                declared = %declared,
                sniffed = %sniffed,
                "Declared media type does not match upload content, using sniffed type"
            );
            sniffed
        }
        (Some(sniffed), _) => sniffed,
        (None, Some(declared)) if limits.allows(&declared) => {
            return Err(ApiError::UnsupportedMediaType(format!(
                "Upload content is not a recognizable {} image",
                declared
            )));
        }
        (None, Some(declared)) => declared,
        (None, None) => {
            return Err(ApiError::UnsupportedMediaType(
                "Could not determine the image format".to_string(),
            ));
        }
    };

    if !limits.allows(&media_type) {
        return Err(unsupported(&media_type, limits));
    }

    Ok(media_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    #[test]
    fn test_declared_type_used() {
        let limits = UploadLimits::default();
        let bytes = Bytes::from_static(JPEG_HEADER);

        let media_type = validate_upload(&bytes, Some("image/jpeg"), &limits).unwrap();
        assert_eq!(media_type, "image/jpeg");
    }

    #[test]
    fn test_declared_type_normalized() {
        let limits = UploadLimits::default();
        let bytes = Bytes::from_static(PNG_HEADER);

        let media_type = validate_upload(&bytes, Some("Image/PNG; charset=binary"), &limits).unwrap();
        assert_eq!(media_type, "image/png");
    }

    #[test]
    fn test_octet_stream_is_sniffed() {
        let limits = UploadLimits::default();
        let bytes = Bytes::from_static(PNG_HEADER);

        let media_type = validate_upload(&bytes, Some("application/octet-stream"), &limits).unwrap();
        assert_eq!(media_type, "image/png");

        let media_type = validate_upload(&Bytes::from_static(JPEG_HEADER), None, &limits).unwrap();
        assert_eq!(media_type, "image/jpeg");
    }

    #[test]
    fn test_unknown_bytes_rejected() {
        let limits = UploadLimits::default();
        let err = validate_upload(&Bytes::from_static(b"hello"), None, &limits).unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_disallowed_type_rejected() {
        let limits = UploadLimits::default();
        let err = validate_upload(&Bytes::from_static(b"%PDF-1.7"), Some("application/pdf"), &limits)
            .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_sniffed_type_wins_over_declared() {
        let limits = UploadLimits::default();
        let bytes = Bytes::from_static(PNG_HEADER);

        let media_type = validate_upload(&bytes, Some("image/jpeg"), &limits).unwrap();
        assert_eq!(media_type, "image/png");
    }

    #[test]
    fn test_text_declared_as_image_rejected() {
        let limits = UploadLimits::default();
        let err = validate_upload(
            &Bytes::from_static(b"just some text, not a picture"),
            Some("image/png"),
            &limits,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_disguised_pdf_rejected() {
        let limits = UploadLimits::default();
        let err = validate_upload(&Bytes::from_static(b"%PDF-1.7\n"), Some("image/jpeg"), &limits)
            .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType(msg) if msg.contains("application/pdf")));
    }

    #[test]
    fn test_oversized_rejected_before_type_check() {
        let limits = UploadLimits {
            max_upload_bytes: 4,
            ..Default::default()
        };
        let err = validate_upload(&Bytes::from_static(PNG_HEADER), Some("text/plain"), &limits)
            .unwrap_err();
        assert!(matches!(err, ApiError::PayloadTooLarge(_)));
    }

    #[test]
    fn test_image_url_validation() {
        assert!(matches!(
            from_image_url(Some("https://example.org/reef.jpg".to_string())),
            Ok(ImageInput::Remote { .. })
        ));
        assert!(matches!(from_image_url(None), Err(ApiError::BadRequest(_))));
        assert!(matches!(
            from_image_url(Some("   ".to_string())),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            from_image_url(Some("not a url".to_string())),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            from_image_url(Some("file:///etc/passwd".to_string())),
            Err(ApiError::BadRequest(_))
        ));
    }
}
