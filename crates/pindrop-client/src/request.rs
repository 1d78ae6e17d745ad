//! Outbound request assembly.
//!
//! Every request to the extraction API carries the bearer token and
//! `Accept: application/json`. Multipart bodies go through reqwest's
//! encoder, which renders the random boundary token, per-part
//! `Content-Disposition`/`Content-Type` headers, and the closing boundary.

use pindrop_core::ClientError;
use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};

/// Join a base URL (stored without a trailing slash) with path segments.
pub(crate) fn endpoint_url(base_url: &str, segments: &[&str]) -> String {
    let mut url = String::from(base_url);
    for segment in segments {
        url.push('/');
        url.push_str(segment);
    }
    url
}

/// Headers sent on every request.
pub(crate) fn with_standard_headers(request: RequestBuilder, token: &str) -> RequestBuilder {
    request
        .header("Authorization", format!("Bearer {token}"))
        .header("Accept", "application/json")
}

/// A multipart form with a single `file` part, for binary uploads.
pub(crate) fn file_form(bytes: Vec<u8>, filename: &str) -> Result<Form, ClientError> {
    let part = Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str(content_type_for(filename))
        .map_err(|e| ClientError::Unknown(format!("Invalid upload content type: {e}")))?;
    Ok(Form::new().part("file", part))
}

fn content_type_for(filename: &str) -> &'static str {
    let extension = filename
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_segments() {
        assert_eq!(
            endpoint_url("https://api.pindrop.example/v1", &["process-url"]),
            "https://api.pindrop.example/v1/process-url"
        );
        assert_eq!(
            endpoint_url("https://api.pindrop.example/v1", &["task", "abc", "status"]),
            "https://api.pindrop.example/v1/task/abc/status"
        );
    }

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(content_type_for("photo.jpg"), "image/jpeg");
        assert_eq!(content_type_for("photo.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("cover.png"), "image/png");
        assert_eq!(content_type_for("shot.HEIC"), "image/heic");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
        assert_eq!(content_type_for("archive.bin"), "application/octet-stream");
    }

    #[test]
    fn test_file_form_has_a_boundary() {
        let form = file_form(vec![0xFF, 0xD8, 0xFF], "photo.jpg").unwrap();
        assert!(!form.boundary().is_empty());
    }
}
