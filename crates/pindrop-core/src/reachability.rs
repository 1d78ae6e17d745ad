//! Network reachability as advisory state.
//!
//! A pure state publisher: platform integrations feed availability via
//! [`ReachabilityMonitor::set_available`], the orchestrator reads it before
//! any network attempt, and interested parties subscribe to the watch
//! channel for push-on-change delivery. The flag is eventually consistent —
//! a request may still fail with a transport error moments after `true`
//! was observed, and that path goes through the transport's normal error
//! mapping.

use std::sync::Arc;

use tokio::sync::watch;

use crate::traits::Reachability;

/// Tracks whether the device currently has a usable network path.
#[derive(Clone)]
pub struct ReachabilityMonitor {
    tx: Arc<watch::Sender<bool>>,
}

impl ReachabilityMonitor {
    pub fn new(initially_available: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_available);
        Self { tx: Arc::new(tx) }
    }

    /// Record the current network path state. Only transitions are
    /// published and logged; repeated reports of the same state are ignored.
    pub fn set_available(&self, available: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current != available {
                *current = available;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::info!(%available, "Network reachability changed");
        }
    }

    pub fn is_available(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to availability transitions. The receiver observes the
    /// current value immediately and each change thereafter.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for ReachabilityMonitor {
    /// Assume the network is up until told otherwise.
    fn default() -> Self {
        Self::new(true)
    }
}

impl Reachability for ReachabilityMonitor {
    fn is_available(&self) -> bool {
        *self.tx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_observed() {
        assert!(ReachabilityMonitor::new(true).is_available());
        assert!(!ReachabilityMonitor::new(false).is_available());
    }

    #[test]
    fn test_transitions_flip_the_flag() {
        let monitor = ReachabilityMonitor::new(true);
        monitor.set_available(false);
        assert!(!monitor.is_available());
        monitor.set_available(true);
        assert!(monitor.is_available());
    }

    #[tokio::test]
    async fn test_subscribers_see_transitions() {
        let monitor = ReachabilityMonitor::new(true);
        let mut rx = monitor.subscribe();

        monitor.set_available(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
    }

    #[test]
    fn test_repeated_state_is_not_published() {
        let monitor = ReachabilityMonitor::new(true);
        let rx = monitor.subscribe();

        monitor.set_available(true);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_clones_share_state() {
        let monitor = ReachabilityMonitor::new(true);
        let other = monitor.clone();
        monitor.set_available(false);
        assert!(!other.is_available());
    }
}
