use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timefmt;

/// Server-reported lifecycle phase of an extraction job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    Queued,
    Processing,
    Complete,
    Failed,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobPhase::Queued => "queued",
            JobPhase::Processing => "processing",
            JobPhase::Complete => "complete",
            JobPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Complete | JobPhase::Failed)
    }
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for JobPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queued" => Ok(JobPhase::Queued),
            "processing" => Ok(JobPhase::Processing),
            "complete" => Ok(JobPhase::Complete),
            "failed" => Ok(JobPhase::Failed),
            _ => Err(format!("Unknown job phase: {}", s)),
        }
    }
}

/// One remote unit of work, tracked from submission to terminal outcome.
///
/// The id is server-assigned and never changes. The registry owns the job
/// from submission until it is terminal or expired.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub task_id: String,
    pub source_url: String,
    #[serde(with = "timefmt")]
    pub submitted_at: DateTime<Utc>,
    pub estimated_seconds: u32,
    pub phase: JobPhase,
}

impl Job {
    /// A job the server just accepted.
    pub fn accepted(
        task_id: impl Into<String>,
        source_url: impl Into<String>,
        estimated_seconds: u32,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            source_url: source_url.into(),
            submitted_at: Utc::now(),
            estimated_seconds,
            phase: JobPhase::Queued,
        }
    }
}

/// Snapshot returned by a single status poll.
///
/// Immutable value, superseded by each new poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub task_id: String,
    #[serde(rename = "status")]
    pub phase: JobPhase,
    /// Percentage 0–100, when the server reports one.
    #[serde(default)]
    pub progress: Option<u8>,
    /// Human-readable stage description (e.g. "fetching video").
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, with = "timefmt::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timefmt::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_roundtrip() {
        for phase in [
            JobPhase::Queued,
            JobPhase::Processing,
            JobPhase::Complete,
            JobPhase::Failed,
        ] {
            let s = phase.as_str();
            let parsed: JobPhase = s.parse().unwrap();
            assert_eq!(parsed, phase);
        }
    }

    #[test]
    fn test_terminal_phases() {
        assert!(!JobPhase::Queued.is_terminal());
        assert!(!JobPhase::Processing.is_terminal());
        assert!(JobPhase::Complete.is_terminal());
        assert!(JobPhase::Failed.is_terminal());
    }

    #[test]
    fn test_phase_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobPhase::Processing).unwrap(),
            "\"processing\""
        );
        let parsed: JobPhase = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(parsed, JobPhase::Complete);
    }

    #[test]
    fn test_status_decodes_with_optional_fields_missing() {
        let status: JobStatus =
            serde_json::from_str(r#"{"task_id": "abc", "status": "queued"}"#).unwrap();
        assert_eq!(status.task_id, "abc");
        assert_eq!(status.phase, JobPhase::Queued);
        assert_eq!(status.progress, None);
        assert_eq!(status.message, None);
        assert_eq!(status.created_at, None);
    }

    #[test]
    fn test_status_decodes_progress_and_message() {
        let status: JobStatus = serde_json::from_str(
            r#"{
                "task_id": "abc",
                "status": "processing",
                "progress": 40,
                "message": "extracting places",
                "updated_at": "2024-06-01T00:35:57.458710Z"
            }"#,
        )
        .unwrap();
        assert_eq!(status.progress, Some(40));
        assert_eq!(status.message.as_deref(), Some("extracting places"));
        assert!(status.updated_at.is_some());
    }

    #[test]
    fn test_accepted_job_starts_queued() {
        let job = Job::accepted("abc", "https://example.com/p/1", 10);
        assert_eq!(job.task_id, "abc");
        assert_eq!(job.phase, JobPhase::Queued);
        assert_eq!(job.estimated_seconds, 10);
    }
}
