use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RESOURCE_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_USER_AGENT: &str = "Pindrop/0.2 (extraction client)";

/// Connection settings for the extraction API.
///
/// Thin adapters (app, share extension, CLI) construct the same client with
/// different base URLs and token sources; everything else is shared policy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL all endpoint paths are relative to. Stored without a
    /// trailing slash.
    pub base_url: String,

    /// Bearer token sent on every request.
    pub auth_token: String,

    /// Per-request timeout.
    pub request_timeout: Duration,

    /// Timeout for large transfers (binary uploads).
    pub resource_timeout: Duration,

    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            resource_timeout: DEFAULT_RESOURCE_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_resource_timeout(mut self, timeout: Duration) -> Self {
        self.resource_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
