//! Typed endpoint client for the extraction API.
//!
//! One client instance per configuration; thin adapters (app, share
//! extension, CLI) differ only in the [`ClientConfig`] they pass in. The
//! shared reqwest client carries the per-request timeout; uploads override
//! it per call with the resource timeout since they move larger bodies.

use pindrop_core::ClientError;
use pindrop_core::job::JobStatus;
use pindrop_core::models::{JobResult, SubmitAck};
use pindrop_core::traits::{ExtractionApi, MediaApi};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::request;
use crate::transport::{self, RawResponse};

/// HTTP implementation of the extraction and media endpoints.
#[derive(Clone)]
pub struct HttpExtractionClient {
    client: Client,
    config: ClientConfig,
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct PhotoUploadResponse {
    #[serde(rename = "photoUrl")]
    photo_url: String,
}

#[derive(Deserialize)]
struct CoverUploadResponse {
    #[serde(rename = "coverUrl")]
    cover_url: String,
}

impl HttpExtractionClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Unknown(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, segments: &[&str]) -> String {
        request::endpoint_url(&self.config.base_url, segments)
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        request::with_standard_headers(self.client.get(url), &self.config.auth_token)
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        request::with_standard_headers(self.client.post(url), &self.config.auth_token)
    }

    async fn upload(
        &self,
        endpoint: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<RawResponse, ClientError> {
        let form = request::file_form(bytes, filename)?;
        let request = self
            .post(endpoint)
            .timeout(self.config.resource_timeout)
            .multipart(form);
        transport::execute(request, self.config.resource_timeout.as_secs()).await
    }
}

impl ExtractionApi for HttpExtractionClient {
    async fn submit(&self, url: &str) -> Result<SubmitAck, ClientError> {
        let endpoint = self.url(&["process-url"]);
        tracing::debug!(%url, "Submitting extraction job");

        let raw = transport::execute(
            self.post(&endpoint).json(&SubmitRequest { url }),
            self.config.request_timeout.as_secs(),
        )
        .await?;

        if raw.status != StatusCode::OK {
            return Err(raw.into_server_error());
        }
        raw.decode()
    }

    async fn status(&self, task_id: &str) -> Result<JobStatus, ClientError> {
        let endpoint = self.url(&["task", task_id, "status"]);

        let raw =
            transport::execute(self.get(&endpoint), self.config.request_timeout.as_secs()).await?;

        match raw.status {
            StatusCode::OK => raw.decode(),
            StatusCode::NOT_FOUND => Err(ClientError::TaskNotFound {
                task_id: task_id.to_string(),
            }),
            _ => Err(raw.into_server_error()),
        }
    }

    async fn result(&self, task_id: &str) -> Result<JobResult, ClientError> {
        let endpoint = self.url(&["task", task_id, "result"]);

        let raw =
            transport::execute(self.get(&endpoint), self.config.request_timeout.as_secs()).await?;

        match raw.status {
            StatusCode::OK => raw.decode(),
            StatusCode::NOT_FOUND => Err(ClientError::TaskNotFound {
                task_id: task_id.to_string(),
            }),
            StatusCode::UNPROCESSABLE_ENTITY => Err(ClientError::TaskNotComplete {
                task_id: task_id.to_string(),
            }),
            _ => Err(raw.into_server_error()),
        }
    }
}

impl MediaApi for HttpExtractionClient {
    async fn upload_photo(
        &self,
        place_id: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<String, ClientError> {
        let endpoint = self.url(&["place", place_id, "photo"]);
        let raw = self.upload(&endpoint, bytes, filename).await?;

        if raw.status != StatusCode::OK {
            return Err(raw.into_server_error());
        }
        let response: PhotoUploadResponse = raw.decode()?;
        Ok(response.photo_url)
    }

    async fn upload_cover(
        &self,
        place_id: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> Result<String, ClientError> {
        let endpoint = self.url(&["place", place_id, "cover"]);
        let raw = self.upload(&endpoint, bytes, filename).await?;

        if raw.status != StatusCode::OK {
            return Err(raw.into_server_error());
        }
        let response: CoverUploadResponse = raw.decode()?;
        Ok(response.cover_url)
    }
}
