//! Test utilities: mock implementations of the core trait seams.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks use
//! `Arc<Mutex<_>>` for interior mutability, allowing test assertions on
//! recorded calls.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::error::ClientError;
use crate::job::{JobPhase, JobStatus};
use crate::models::{JobResult, Place, PlaceRecord, ProcessingMetadata, SubmitAck};
use crate::traits::{ExtractionApi, PlaceStore};

// ---------------------------------------------------------------------------
// MockExtractionApi
// ---------------------------------------------------------------------------

/// Mock extraction API with scripted per-endpoint response queues.
///
/// Each call pops the first queued response for its endpoint. When a queue
/// is empty, a benign default is returned: submit acks `task-1`, status
/// answers `processing` (so poll loops keep spinning), result is empty.
/// Every call is recorded for assertions.
#[derive(Clone, Default)]
pub struct MockExtractionApi {
    submit_responses: Arc<Mutex<Vec<Result<SubmitAck, ClientError>>>>,
    status_responses: Arc<Mutex<Vec<Result<JobStatus, ClientError>>>>,
    result_responses: Arc<Mutex<Vec<Result<JobResult, ClientError>>>>,
    pub submit_calls: Arc<Mutex<Vec<String>>>,
    pub status_calls: Arc<Mutex<Vec<String>>>,
    pub result_calls: Arc<Mutex<Vec<String>>>,
}

impl MockExtractionApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_submit(&self, response: Result<SubmitAck, ClientError>) {
        self.submit_responses.lock().unwrap().push(response);
    }

    pub fn queue_status(&self, response: Result<JobStatus, ClientError>) {
        self.status_responses.lock().unwrap().push(response);
    }

    pub fn queue_result(&self, response: Result<JobResult, ClientError>) {
        self.result_responses.lock().unwrap().push(response);
    }
}

impl ExtractionApi for MockExtractionApi {
    async fn submit(&self, url: &str) -> Result<SubmitAck, ClientError> {
        self.submit_calls.lock().unwrap().push(url.to_string());
        let mut responses = self.submit_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(make_submit_ack("task-1", 10))
        } else {
            responses.remove(0)
        }
    }

    async fn status(&self, task_id: &str) -> Result<JobStatus, ClientError> {
        self.status_calls.lock().unwrap().push(task_id.to_string());
        let mut responses = self.status_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(make_job_status(task_id, JobPhase::Processing))
        } else {
            responses.remove(0)
        }
    }

    async fn result(&self, task_id: &str) -> Result<JobResult, ClientError> {
        self.result_calls.lock().unwrap().push(task_id.to_string());
        let mut responses = self.result_responses.lock().unwrap();
        if responses.is_empty() {
            Ok(make_job_result("https://example.com", vec![]))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockPlaceStore
// ---------------------------------------------------------------------------

/// Mock store that records saves and deduplicates by source URL, matching
/// the collaborator contract.
#[derive(Clone, Default)]
pub struct MockPlaceStore {
    pub saved: Arc<Mutex<Vec<PlaceRecord>>>,
    seen_urls: Arc<Mutex<HashSet<String>>>,
}

impl MockPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlaceStore for MockPlaceStore {
    async fn save_all(&self, records: &[PlaceRecord]) -> Result<usize, ClientError> {
        let mut seen = self.seen_urls.lock().unwrap();
        let mut saved = self.saved.lock().unwrap();
        let fresh: Vec<PlaceRecord> = records
            .iter()
            .filter(|r| !seen.contains(&r.source_url))
            .cloned()
            .collect();
        for record in &fresh {
            seen.insert(record.source_url.clone());
        }
        let stored = fresh.len();
        saved.extend(fresh);
        Ok(stored)
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// An ack for a freshly accepted job.
pub fn make_submit_ack(task_id: &str, estimated_seconds: u32) -> SubmitAck {
    SubmitAck {
        task_id: task_id.to_string(),
        phase: JobPhase::Queued,
        estimated_seconds,
        platform: None,
    }
}

/// A status snapshot in the given phase with no optional fields.
pub fn make_job_status(task_id: &str, phase: JobPhase) -> JobStatus {
    JobStatus {
        task_id: task_id.to_string(),
        phase,
        progress: None,
        message: None,
        created_at: None,
        updated_at: Some(Utc::now()),
    }
}

/// A `failed` status snapshot carrying the server's stage message.
pub fn make_failed_status(task_id: &str, message: &str) -> JobStatus {
    JobStatus {
        message: Some(message.to_string()),
        ..make_job_status(task_id, JobPhase::Failed)
    }
}

/// A terminal payload for the given source URL.
pub fn make_job_result(url: &str, places: Vec<Place>) -> JobResult {
    JobResult {
        url: url.to_string(),
        platform: None,
        places,
        metadata: ProcessingMetadata::default(),
    }
}

/// A place with only a name, full confidence.
pub fn make_place(name: &str) -> Place {
    Place {
        name: name.to_string(),
        address: None,
        rating: None,
        photo_reference: None,
        confidence: 1.0,
    }
}
