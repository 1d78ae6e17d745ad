//! Single request/response execution and error classification.
//!
//! Transport failures are mapped into [`ClientError`] here, exactly once;
//! no raw reqwest error crosses this boundary. Cancellation is structural
//! (the caller drops the in-flight future) and is never represented as an
//! error. Retry policy lives in the orchestrator, not here.

use pindrop_core::ClientError;
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Status code and raw body of one completed exchange.
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Execute exactly one request.
pub(crate) async fn execute(
    request: RequestBuilder,
    timeout_secs: u64,
) -> Result<RawResponse, ClientError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::Timeout(timeout_secs)
        } else if e.is_connect() {
            tracing::debug!(error = %e, "Connection failed");
            ClientError::NetworkUnavailable
        } else {
            ClientError::Unknown(e.to_string())
        }
    })?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| ClientError::Unknown(format!("Failed to read response body: {e}")))?;

    Ok(RawResponse {
        status,
        body: body.to_vec(),
    })
}

/// Error body the server attaches to non-success responses. Some
/// deployments use `detail` instead of `message`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl RawResponse {
    pub(crate) fn decode<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        serde_json::from_slice(&self.body).map_err(|e| {
            ClientError::DecodingError(format!("HTTP {}: {e}", self.status.as_u16()))
        })
    }

    /// The error for a non-success response, preferring the server's own
    /// code and message when the body carries them.
    pub(crate) fn into_server_error(self) -> ClientError {
        let status = self.status.as_u16();
        match serde_json::from_slice::<ErrorBody>(&self.body) {
            Ok(body) => ClientError::ServerError {
                status,
                code: body.code,
                message: body
                    .message
                    .or(body.detail)
                    .unwrap_or_else(|| format!("HTTP {status}")),
            },
            Err(_) => {
                let text = String::from_utf8_lossy(&self.body);
                let text = text.trim();
                ClientError::ServerError {
                    status,
                    code: None,
                    message: if text.is_empty() {
                        format!("HTTP {status}")
                    } else {
                        text.to_string()
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: StatusCode, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_server_error_decodes_code_and_message() {
        let error = raw(
            StatusCode::BAD_REQUEST,
            r#"{"code": "unsupported_platform", "message": "cannot extract from this site"}"#,
        )
        .into_server_error();
        match error {
            ClientError::ServerError {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("unsupported_platform"));
                assert_eq!(message, "cannot extract from this site");
            }
            other => panic!("expected server_error, got {other:?}"),
        }
    }

    #[test]
    fn test_server_error_accepts_detail_field() {
        let error = raw(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "worker crashed"}"#,
        )
        .into_server_error();
        match error {
            ClientError::ServerError { message, code, .. } => {
                assert_eq!(message, "worker crashed");
                assert_eq!(code, None);
            }
            other => panic!("expected server_error, got {other:?}"),
        }
    }

    #[test]
    fn test_server_error_falls_back_to_raw_body() {
        let error = raw(StatusCode::BAD_GATEWAY, "upstream unavailable").into_server_error();
        match error {
            ClientError::ServerError {
                status, message, ..
            } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("expected server_error, got {other:?}"),
        }
    }

    #[test]
    fn test_server_error_with_empty_body_names_the_status() {
        let error = raw(StatusCode::SERVICE_UNAVAILABLE, "").into_server_error();
        match error {
            ClientError::ServerError { message, .. } => assert_eq!(message, "HTTP 503"),
            other => panic!("expected server_error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_failure_is_a_decoding_error() {
        let result: Result<serde_json::Value, _> = raw(StatusCode::OK, "not json").decode();
        assert!(matches!(result, Err(ClientError::DecodingError(_))));
    }
}
