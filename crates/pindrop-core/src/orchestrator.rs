//! The extraction job state machine.
//!
//! One logical asynchronous task per job: submit, poll with capped-linear
//! backoff, fetch the result, convert to place records. Reachability is
//! consulted before every network attempt, the task registry bounds how
//! many jobs are in flight, and a cancellation token can stop the job at
//! any suspension point without that counting as a failure.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::ClientError;
use crate::job::{JobPhase, JobStatus};
use crate::models::{JobResult, PlaceRecord};
use crate::registry::TaskRegistry;
use crate::traits::{ExtractionApi, Reachability};

/// Poll delays ramp linearly up to this multiple of the base interval.
const BACKOFF_RAMP_CAP: u32 = 3;

/// Tunables for the submit → poll → fetch lifecycle.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Base delay between status polls.
    pub poll_interval: Duration,

    /// Maximum number of status polls before the job is considered timed out.
    pub max_poll_attempts: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_poll_attempts: 30,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Delay before poll attempt `attempt` (1-indexed): linear ramp capped
    /// at [`BACKOFF_RAMP_CAP`] times the base interval.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.poll_interval * attempt.clamp(1, BACKOFF_RAMP_CAP)
    }

    /// Total time the poll loop may wait across the full attempt ceiling.
    pub fn poll_window(&self) -> Duration {
        (1..=self.max_poll_attempts)
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }
}

/// Terminal outcome of a job that did not fail.
#[derive(Debug)]
pub enum JobOutcome {
    /// The job finished; extracted places converted to caller records.
    Complete(Vec<PlaceRecord>),
    /// The caller cancelled the job. Not a failure.
    Cancelled,
}

/// Events emitted while a job runs, for decoupled logging/observability.
#[derive(Debug, Clone)]
pub enum JobEvent<'a> {
    Submitted {
        task_id: &'a str,
        url: &'a str,
        estimated_seconds: u32,
    },
    StatusReceived {
        task_id: &'a str,
        status: &'a JobStatus,
        attempt: u32,
    },
    PollFailed {
        task_id: &'a str,
        attempt: u32,
        error: &'a ClientError,
    },
    Completed {
        task_id: &'a str,
        places: usize,
    },
    Failed {
        task_id: Option<&'a str>,
        error: &'a ClientError,
    },
    TimedOut {
        task_id: &'a str,
        attempts: u32,
    },
    Cancelled {
        task_id: Option<&'a str>,
    },
}

/// Trait for receiving job events (decoupled logging).
pub trait JobObserver: Send + Sync {
    fn observe(&self, event: JobEvent<'_>) {
        let _ = event;
    }
}

/// Observer that logs through the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingJobObserver;

impl JobObserver for TracingJobObserver {
    fn observe(&self, event: JobEvent<'_>) {
        match event {
            JobEvent::Submitted {
                task_id,
                url,
                estimated_seconds,
            } => {
                tracing::info!(%task_id, %url, estimated_seconds, "Job submitted");
            }
            JobEvent::StatusReceived {
                task_id,
                status,
                attempt,
            } => {
                tracing::debug!(
                    %task_id,
                    phase = %status.phase,
                    progress = ?status.progress,
                    attempt,
                    "Status received"
                );
            }
            JobEvent::PollFailed {
                task_id,
                attempt,
                error,
            } => {
                tracing::debug!(%task_id, attempt, %error, "Poll attempt failed, continuing");
            }
            JobEvent::Completed { task_id, places } => {
                tracing::info!(%task_id, places, "Job completed");
            }
            JobEvent::Failed { task_id, error } => {
                tracing::warn!(?task_id, %error, "Job failed");
            }
            JobEvent::TimedOut { task_id, attempts } => {
                tracing::warn!(%task_id, attempts, "Job timed out");
            }
            JobEvent::Cancelled { task_id } => {
                tracing::info!(?task_id, "Job cancelled");
            }
        }
    }
}

/// Internal verdict of the poll loop.
enum PollVerdict {
    Complete,
    Cancelled,
}

/// Holds an admitted registry slot. Releasing on drop covers every exit
/// path, including cancellation and the caller dropping the job future.
struct RegistrySlot<'a> {
    registry: &'a TaskRegistry,
    task_id: String,
}

impl Drop for RegistrySlot<'_> {
    fn drop(&mut self) {
        self.registry.release(&self.task_id);
    }
}

/// Drives one extraction job from submission to a terminal outcome.
///
/// Explicitly constructed and owned by the caller; adapters that need
/// one-instance-per-process semantics hold it themselves.
#[derive(Clone)]
pub struct JobOrchestrator<A, R>
where
    A: ExtractionApi,
    R: Reachability,
{
    api: A,
    reachability: R,
    registry: TaskRegistry,
    config: OrchestratorConfig,
}

impl<A, R> JobOrchestrator<A, R>
where
    A: ExtractionApi,
    R: Reachability,
{
    pub fn new(api: A, reachability: R, registry: TaskRegistry, config: OrchestratorConfig) -> Self {
        Self {
            api,
            reachability,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Run a job with the default tracing observer.
    pub async fn process(
        &self,
        url: &str,
        cancel: CancellationToken,
    ) -> Result<JobOutcome, ClientError> {
        self.run(url, cancel, &TracingJobObserver).await
    }

    /// Run one job: validate, gate on reachability and admission, submit,
    /// poll until terminal, fetch and convert the result.
    pub async fn run<O: JobObserver>(
        &self,
        url: &str,
        cancel: CancellationToken,
        observer: &O,
    ) -> Result<JobOutcome, ClientError> {
        validate_source_url(url)?;
        self.ensure_reachable()?;

        // Wait for an in-flight slot before touching the network.
        let admitted = tokio::select! {
            result = self.registry.await_admission() => result,
            () = cancel.cancelled() => {
                observer.observe(JobEvent::Cancelled { task_id: None });
                return Ok(JobOutcome::Cancelled);
            }
        };
        if let Err(error) = admitted {
            observer.observe(JobEvent::Failed {
                task_id: None,
                error: &error,
            });
            return Err(error);
        }

        // The admission wait may have been long; re-check the path.
        self.ensure_reachable()?;

        let submitted = tokio::select! {
            result = self.api.submit(url) => result,
            () = cancel.cancelled() => {
                observer.observe(JobEvent::Cancelled { task_id: None });
                return Ok(JobOutcome::Cancelled);
            }
        };
        let ack = match submitted {
            Ok(ack) => ack,
            Err(error) => {
                observer.observe(JobEvent::Failed {
                    task_id: None,
                    error: &error,
                });
                return Err(error);
            }
        };

        if !self.registry.try_admit(&ack.task_id, ack.estimated_seconds) {
            let error = ClientError::TooManyRequests;
            observer.observe(JobEvent::Failed {
                task_id: Some(&ack.task_id),
                error: &error,
            });
            return Err(error);
        }
        let _slot = RegistrySlot {
            registry: &self.registry,
            task_id: ack.task_id.clone(),
        };

        observer.observe(JobEvent::Submitted {
            task_id: &ack.task_id,
            url,
            estimated_seconds: ack.estimated_seconds,
        });

        match self.poll_until_complete(&ack.task_id, &cancel, observer).await {
            Ok(PollVerdict::Complete) => {}
            Ok(PollVerdict::Cancelled) => {
                observer.observe(JobEvent::Cancelled {
                    task_id: Some(&ack.task_id),
                });
                return Ok(JobOutcome::Cancelled);
            }
            Err(error) => {
                self.observe_terminal_error(&ack.task_id, &error, observer);
                return Err(error);
            }
        }

        let fetched = tokio::select! {
            result = self.fetch_result(&ack.task_id) => result,
            () = cancel.cancelled() => {
                observer.observe(JobEvent::Cancelled {
                    task_id: Some(&ack.task_id),
                });
                return Ok(JobOutcome::Cancelled);
            }
        };
        match fetched {
            Ok(result) => {
                let records = result.into_records();
                observer.observe(JobEvent::Completed {
                    task_id: &ack.task_id,
                    places: records.len(),
                });
                Ok(JobOutcome::Complete(records))
            }
            Err(error) => {
                self.observe_terminal_error(&ack.task_id, &error, observer);
                Err(error)
            }
        }
    }

    /// Poll the status endpoint until the job reaches a terminal phase.
    ///
    /// Transport errors are swallowed up to the attempt ceiling; the phase
    /// `failed`, reachability loss, and the final attempt's error surface
    /// immediately.
    async fn poll_until_complete<O: JobObserver>(
        &self,
        task_id: &str,
        cancel: &CancellationToken,
        observer: &O,
    ) -> Result<PollVerdict, ClientError> {
        for attempt in 1..=self.config.max_poll_attempts {
            let delay = self.config.delay_for_attempt(attempt);
            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                () = cancel.cancelled() => return Ok(PollVerdict::Cancelled),
            }

            self.ensure_reachable()?;

            let polled = tokio::select! {
                result = self.api.status(task_id) => result,
                () = cancel.cancelled() => return Ok(PollVerdict::Cancelled),
            };
            match polled {
                Ok(status) => {
                    observer.observe(JobEvent::StatusReceived {
                        task_id,
                        status: &status,
                        attempt,
                    });
                    match status.phase {
                        JobPhase::Complete => return Ok(PollVerdict::Complete),
                        JobPhase::Failed => {
                            return Err(ClientError::ProcessingFailed {
                                task_id: task_id.to_string(),
                                stage: status
                                    .message
                                    .unwrap_or_else(|| "extraction failed".to_string()),
                            });
                        }
                        JobPhase::Queued | JobPhase::Processing => {}
                    }
                }
                Err(error) if error.halts_polling() => return Err(error),
                Err(error) if attempt == self.config.max_poll_attempts => return Err(error),
                Err(error) => {
                    observer.observe(JobEvent::PollFailed {
                        task_id,
                        attempt,
                        error: &error,
                    });
                }
            }
        }

        Err(ClientError::Timeout(self.config.poll_window().as_secs()))
    }

    /// Fetch the terminal payload. A `task_not_complete` response is a
    /// transient inconsistency between the status and result endpoints;
    /// it is retried once after one base interval.
    async fn fetch_result(&self, task_id: &str) -> Result<JobResult, ClientError> {
        match self.api.result(task_id).await {
            Err(ClientError::TaskNotComplete { .. }) => {
                tracing::debug!(%task_id, "Result not ready despite complete status, retrying once");
                tokio::time::sleep(self.config.poll_interval).await;
                self.api.result(task_id).await
            }
            other => other,
        }
    }

    fn ensure_reachable(&self) -> Result<(), ClientError> {
        if self.reachability.is_available() {
            Ok(())
        } else {
            tracing::debug!("Reachability gate rejected network attempt");
            Err(ClientError::NetworkUnavailable)
        }
    }

    fn observe_terminal_error<O: JobObserver>(
        &self,
        task_id: &str,
        error: &ClientError,
        observer: &O,
    ) {
        match error {
            ClientError::Timeout(_) => observer.observe(JobEvent::TimedOut {
                task_id,
                attempts: self.config.max_poll_attempts,
            }),
            _ => observer.observe(JobEvent::Failed {
                task_id: Some(task_id),
                error,
            }),
        }
    }
}

/// Cheap structural validation before any network attempt.
fn validate_source_url(raw: &str) -> Result<(), ClientError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::InvalidUrl("empty URL".into()));
    }
    let parsed =
        Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl(format!("{trimmed}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(ClientError::InvalidUrl(format!(
                "scheme '{scheme}' is not supported"
            )));
        }
    }
    if parsed.host_str().is_none() {
        return Err(ClientError::InvalidUrl(format!("{trimmed}: missing host")));
    }
    Ok(())
}
