//! Bounded tracking of in-flight extraction jobs.
//!
//! The registry is the only shared mutable state between concurrent jobs;
//! every mutation happens under a single mutex. Expired entries are purged
//! lazily whenever the registry is consulted — the bound is advisory, so no
//! background sweep task is needed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::error::ClientError;

/// Configuration for the in-flight job ceiling and expiry policy.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of simultaneously tracked jobs.
    pub max_concurrent: usize,

    /// How long a submission may wait for a slot before `too_many_requests`.
    pub admission_wait: Duration,

    /// Re-check cadence while waiting for a slot.
    pub admission_poll_interval: Duration,

    /// An entry expires after `estimate × multiplier`, capped at `max_tracked`.
    pub expiry_multiplier: u32,

    /// Hard ceiling on how long any entry is tracked.
    pub max_tracked: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            admission_wait: Duration::from_secs(30),
            admission_poll_interval: Duration::from_secs(1),
            expiry_multiplier: 3,
            max_tracked: Duration::from_secs(600),
        }
    }
}

impl RegistryConfig {
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn with_admission_wait(mut self, wait: Duration) -> Self {
        self.admission_wait = wait;
        self
    }

    pub fn with_admission_poll_interval(mut self, interval: Duration) -> Self {
        self.admission_poll_interval = interval;
        self
    }
}

#[derive(Debug)]
struct TrackedJob {
    registered_at: Instant,
    ttl: Duration,
}

impl TrackedJob {
    fn is_expired(&self) -> bool {
        self.registered_at.elapsed() > self.ttl
    }
}

/// Bounded collection of in-flight jobs keyed by task id.
///
/// Clones share the same underlying state.
#[derive(Clone)]
pub struct TaskRegistry {
    config: RegistryConfig,
    inner: Arc<Mutex<HashMap<String, TrackedJob>>>,
}

impl TaskRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Acquires the inner mutex lock, recovering from poison if necessary.
    fn lock_inner(&self) -> MutexGuard<'_, HashMap<String, TrackedJob>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Recovered from poisoned registry mutex");
            poisoned.into_inner()
        })
    }

    fn ttl_for(&self, estimate_secs: u32) -> Duration {
        let scaled =
            Duration::from_secs(u64::from(estimate_secs) * u64::from(self.config.expiry_multiplier));
        std::cmp::min(scaled, self.config.max_tracked)
    }

    fn purge_expired(map: &mut HashMap<String, TrackedJob>) {
        map.retain(|task_id, job| {
            let keep = !job.is_expired();
            if !keep {
                tracing::debug!(%task_id, "Expired job purged from registry");
            }
            keep
        });
    }

    /// Register a job the server just accepted. Expired entries are purged
    /// first; returns false if the ceiling would be exceeded. Registering an
    /// already-tracked id is a no-op returning true.
    ///
    /// Invariant: the registry never holds more than `max_concurrent`
    /// entries at the moment this returns true.
    pub fn try_admit(&self, task_id: &str, estimate_secs: u32) -> bool {
        let mut map = self.lock_inner();
        Self::purge_expired(&mut map);

        if map.contains_key(task_id) {
            return true;
        }
        if map.len() >= self.config.max_concurrent {
            tracing::warn!(
                %task_id,
                in_flight = map.len(),
                max = self.config.max_concurrent,
                "Admission refused, registry at capacity"
            );
            return false;
        }

        map.insert(
            task_id.to_string(),
            TrackedJob {
                registered_at: Instant::now(),
                ttl: self.ttl_for(estimate_secs),
            },
        );
        true
    }

    /// Suspend until a slot is free, re-checking every
    /// `admission_poll_interval`. Fails with `too_many_requests` once
    /// `admission_wait` elapses without capacity.
    pub async fn await_admission(&self) -> Result<(), ClientError> {
        let deadline = tokio::time::Instant::now() + self.config.admission_wait;
        loop {
            if self.has_capacity() {
                return Ok(());
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                tracing::warn!(
                    max = self.config.max_concurrent,
                    waited_ms = self.config.admission_wait.as_millis() as u64,
                    "No slot freed within the admission window"
                );
                return Err(ClientError::TooManyRequests);
            }
            let remaining = deadline - now;
            tokio::time::sleep(std::cmp::min(self.config.admission_poll_interval, remaining))
                .await;
        }
    }

    /// Idempotent removal.
    pub fn release(&self, task_id: &str) {
        let mut map = self.lock_inner();
        if map.remove(task_id).is_some() {
            tracing::debug!(%task_id, "Job released from registry");
        }
    }

    pub fn contains(&self, task_id: &str) -> bool {
        let mut map = self.lock_inner();
        Self::purge_expired(&mut map);
        map.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        let mut map = self.lock_inner();
        Self::purge_expired(&mut map);
        map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_capacity(&self) -> bool {
        let mut map = self.lock_inner();
        Self::purge_expired(&mut map);
        map.len() < self.config.max_concurrent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> RegistryConfig {
        RegistryConfig::default()
            .with_max_concurrent(5)
            .with_admission_wait(Duration::from_millis(80))
            .with_admission_poll_interval(Duration::from_millis(10))
    }

    #[test]
    fn test_ceiling_is_enforced() {
        let registry = TaskRegistry::new(RegistryConfig::default().with_max_concurrent(2));
        assert!(registry.try_admit("a", 60));
        assert!(registry.try_admit("b", 60));
        assert!(!registry.try_admit("c", 60));
        assert_eq!(registry.len(), 2);

        registry.release("a");
        assert!(registry.try_admit("c", 60));
    }

    #[test]
    fn test_readmitting_known_id_is_noop() {
        let registry = TaskRegistry::new(RegistryConfig::default().with_max_concurrent(2));
        assert!(registry.try_admit("a", 60));
        assert!(registry.try_admit("a", 60));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_release_is_idempotent() {
        let registry = TaskRegistry::new(RegistryConfig::default());
        assert!(registry.try_admit("a", 60));
        registry.release("a");
        registry.release("a");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_zero_estimate_expires_immediately() {
        let registry = TaskRegistry::new(RegistryConfig::default().with_max_concurrent(1));
        assert!(registry.try_admit("a", 0));
        // Purged on the next consultation, freeing the slot.
        assert!(!registry.contains("a"));
        assert!(registry.try_admit("b", 60));
    }

    #[test]
    fn test_ttl_is_capped_by_max_tracked() {
        let registry = TaskRegistry::new(RegistryConfig {
            max_tracked: Duration::from_secs(10),
            ..RegistryConfig::default()
        });
        assert_eq!(registry.ttl_for(2), Duration::from_secs(6));
        assert_eq!(registry.ttl_for(100), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_admission_times_out_at_capacity() {
        let registry = TaskRegistry::new(quick_config());
        for id in ["a", "b", "c", "d", "e"] {
            assert!(registry.try_admit(id, 60));
        }

        let start = Instant::now();
        let result = registry.await_admission().await;
        assert!(matches!(result, Err(ClientError::TooManyRequests)));
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_admission_unblocks_when_a_slot_frees() {
        let registry = TaskRegistry::new(quick_config());
        for id in ["a", "b", "c", "d", "e"] {
            assert!(registry.try_admit(id, 60));
        }

        let releaser = registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            releaser.release("c");
        });

        registry.await_admission().await.unwrap();
        assert!(registry.try_admit("f", 60));
    }

    #[tokio::test]
    async fn test_admission_is_immediate_below_ceiling() {
        let registry = TaskRegistry::new(quick_config());
        let start = Instant::now();
        registry.await_admission().await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
