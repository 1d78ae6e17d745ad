use std::future::Future;

use crate::error::ClientError;
use crate::job::JobStatus;
use crate::models::{JobResult, PlaceRecord, SubmitAck};

/// Submits extraction jobs and reads their status and result.
pub trait ExtractionApi: Send + Sync + Clone {
    /// Submit a source URL for extraction.
    fn submit(&self, url: &str) -> impl Future<Output = Result<SubmitAck, ClientError>> + Send;

    fn status(&self, task_id: &str)
    -> impl Future<Output = Result<JobStatus, ClientError>> + Send;

    /// Fetch the terminal payload of a completed job.
    fn result(&self, task_id: &str)
    -> impl Future<Output = Result<JobResult, ClientError>> + Send;
}

/// Uploads binary media attached to an extracted place.
pub trait MediaApi: Send + Sync + Clone {
    /// Upload a photo; returns the hosted URL.
    fn upload_photo(
        &self,
        place_id: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Upload a cover image; returns the hosted URL.
    fn upload_cover(
        &self,
        place_id: &str,
        bytes: Vec<u8>,
        filename: &str,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;
}

/// Advisory network availability, read before any network attempt.
///
/// Eventually consistent: a request may still fail with a transport error
/// moments after `true` was observed.
pub trait Reachability: Send + Sync + Clone {
    fn is_available(&self) -> bool;
}

/// Persistence collaborator for extracted place records.
///
/// Implementations deduplicate by the record's `source_url` key. The
/// orchestration engine never calls this itself; it hands records back to
/// the caller, which may persist them.
pub trait PlaceStore: Send + Sync + Clone {
    /// Save records, returning how many were newly stored.
    fn save_all(
        &self,
        records: &[PlaceRecord],
    ) -> impl Future<Output = Result<usize, ClientError>> + Send;
}

/// A no-op `PlaceStore` for callers that do not persist results.
#[derive(Debug, Clone)]
pub struct NullStore;

impl PlaceStore for NullStore {
    async fn save_all(&self, _records: &[PlaceRecord]) -> Result<usize, ClientError> {
        Ok(0)
    }
}
