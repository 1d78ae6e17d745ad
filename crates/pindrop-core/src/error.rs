use thiserror::Error;

/// Typed failure for every operation of the extraction client.
///
/// Each variant maps to a stable machine-readable code via [`code`](Self::code).
/// UI layers render the `Display` message and may inspect
/// [`details`](Self::details) for structured context. Cancellation is
/// deliberately not represented here — a cancelled job is a separate
/// outcome, not a failure.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input failed structural validation; no network attempt was made.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The device has no usable network path; no request was attempted.
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// A request, or the whole polling window, timed out.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// The in-flight job ceiling was reached and no slot freed in time.
    #[error("Too many concurrent extraction jobs")]
    TooManyRequests,

    /// The server no longer knows the task.
    #[error("Task {task_id} not found")]
    TaskNotFound { task_id: String },

    /// The status and result endpoints disagree; the result is not ready yet.
    #[error("Task {task_id} is not complete yet")]
    TaskNotComplete { task_id: String },

    /// The server reported that the extraction itself failed.
    #[error("Processing failed for task {task_id}: {stage}")]
    ProcessingFailed { task_id: String, stage: String },

    /// Any other non-success HTTP response.
    #[error("Server error (HTTP {status}): {message}")]
    ServerError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A response body could not be decoded.
    #[error("Decoding error: {0}")]
    DecodingError(String),

    /// Anything the transport could not classify.
    #[error("{0}")]
    Unknown(String),
}

impl ClientError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::InvalidUrl(_) => "invalid_url",
            ClientError::NetworkUnavailable => "network_unavailable",
            ClientError::Timeout(_) => "timeout",
            ClientError::TooManyRequests => "too_many_requests",
            ClientError::TaskNotFound { .. } => "task_not_found",
            ClientError::TaskNotComplete { .. } => "task_not_complete",
            ClientError::ProcessingFailed { .. } => "processing_failed",
            ClientError::ServerError { .. } => "server_error",
            ClientError::DecodingError(_) => "decoding_error",
            ClientError::Unknown(_) => "unknown_error",
        }
    }

    /// The server-supplied error code, if this is a server error that carried one.
    pub fn server_code(&self) -> Option<&str> {
        match self {
            ClientError::ServerError { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Structured detail map for UI layers.
    pub fn details(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert("code".into(), self.code().into());
        match self {
            ClientError::Timeout(secs) => {
                map.insert("timeout_seconds".into(), (*secs).into());
            }
            ClientError::TaskNotFound { task_id }
            | ClientError::TaskNotComplete { task_id } => {
                map.insert("task_id".into(), task_id.clone().into());
            }
            ClientError::ProcessingFailed { task_id, stage } => {
                map.insert("task_id".into(), task_id.clone().into());
                map.insert("stage".into(), stage.clone().into());
            }
            ClientError::ServerError { status, code, .. } => {
                map.insert("status".into(), (*status).into());
                if let Some(code) = code {
                    map.insert("server_code".into(), code.clone().into());
                }
            }
            _ => {}
        }
        map
    }

    /// Whether this error must stop a poll loop instead of being swallowed.
    ///
    /// Reachability loss is the one case: further attempts would fail the
    /// same way without the server ever being consulted.
    pub fn halts_polling(&self) -> bool {
        matches!(self, ClientError::NetworkUnavailable)
    }
}
