pub mod error;
pub mod job;
pub mod models;
pub mod orchestrator;
pub mod reachability;
pub mod registry;
pub mod testutil;
pub mod timefmt;
pub mod traits;

pub use error::ClientError;
pub use job::{Job, JobPhase, JobStatus};
pub use models::{JobResult, Place, PlaceRecord, ProcessingMetadata, SubmitAck};
pub use orchestrator::{
    JobEvent, JobObserver, JobOrchestrator, JobOutcome, OrchestratorConfig, TracingJobObserver,
};
pub use reachability::ReachabilityMonitor;
pub use registry::{RegistryConfig, TaskRegistry};
pub use traits::{ExtractionApi, MediaApi, NullStore, PlaceStore, Reachability};
