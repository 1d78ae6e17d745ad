use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::JobPhase;
use crate::timefmt;

/// Response to a job submission: the server accepted the URL for processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAck {
    pub task_id: String,
    #[serde(rename = "status")]
    pub phase: JobPhase,
    /// Server's completion estimate. Some deployments omit it; the default
    /// keeps registry expiry meaningful for fresh entries.
    #[serde(rename = "estimated_time", default = "default_estimated_seconds")]
    pub estimated_seconds: u32,
    /// Source platform the server recognised (e.g. "instagram").
    #[serde(default)]
    pub platform: Option<String>,
}

fn default_estimated_seconds() -> u32 {
    30
}

/// A place extracted from the source content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub photo_reference: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

/// Processing metadata attached to a finished job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    #[serde(default)]
    pub processing_time_seconds: Option<f64>,
    #[serde(default)]
    pub place_count: Option<u32>,
}

/// Terminal payload of a successfully completed job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// The originating input.
    pub url: String,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub metadata: ProcessingMetadata,
}

impl JobResult {
    /// Convert the wire payload into caller-facing records, each stamped
    /// with its provenance.
    pub fn into_records(self) -> Vec<PlaceRecord> {
        let extracted_at = Utc::now();
        let source_url = self.url;
        self.places
            .into_iter()
            .map(|place| PlaceRecord {
                name: place.name,
                address: place.address,
                rating: place.rating,
                photo_reference: place.photo_reference,
                confidence: place.confidence,
                source_url: source_url.clone(),
                extracted_at,
            })
            .collect()
    }
}

/// One extracted place as handed to callers and persistence collaborators.
///
/// Stores deduplicate these by the `source_url` key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f32>,
    pub photo_reference: Option<String>,
    pub confidence: f32,
    pub source_url: String,
    #[serde(with = "timefmt")]
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_ack_defaults_missing_estimate() {
        let ack: SubmitAck =
            serde_json::from_str(r#"{"task_id": "abc", "status": "queued"}"#).unwrap();
        assert_eq!(ack.estimated_seconds, 30);
        assert_eq!(ack.platform, None);
    }

    #[test]
    fn test_submit_ack_decodes_estimate_and_platform() {
        let ack: SubmitAck = serde_json::from_str(
            r#"{"task_id": "abc", "status": "queued", "estimated_time": 12, "platform": "tiktok"}"#,
        )
        .unwrap();
        assert_eq!(ack.estimated_seconds, 12);
        assert_eq!(ack.platform.as_deref(), Some("tiktok"));
    }

    #[test]
    fn test_place_decodes_with_sparse_fields() {
        let place: Place = serde_json::from_str(r#"{"name": "Test Place"}"#).unwrap();
        assert_eq!(place.name, "Test Place");
        assert_eq!(place.address, None);
        assert_eq!(place.rating, None);
        assert_eq!(place.confidence, 1.0);
    }

    #[test]
    fn test_result_converts_to_records_with_provenance() {
        let result: JobResult = serde_json::from_str(
            r#"{
                "url": "https://example.com/p/1",
                "platform": "instagram",
                "places": [
                    {"name": "Test Place", "address": "1 Main St", "rating": 4.5, "confidence": 0.92},
                    {"name": "Other Place"}
                ],
                "metadata": {"processing_time_seconds": 8.3, "place_count": 2}
            }"#,
        )
        .unwrap();

        let records = result.into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Test Place");
        assert_eq!(records[0].address.as_deref(), Some("1 Main St"));
        assert_eq!(records[0].confidence, 0.92);
        assert!(records.iter().all(|r| r.source_url == "https://example.com/p/1"));
    }

    #[test]
    fn test_result_with_no_places_yields_no_records() {
        let result: JobResult =
            serde_json::from_str(r#"{"url": "https://example.com/p/1"}"#).unwrap();
        assert!(result.into_records().is_empty());
    }
}
