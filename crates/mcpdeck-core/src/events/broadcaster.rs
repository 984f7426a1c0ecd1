//! Broadcast fan-out for reconciliation events.
//!
//! The engine itself drives a single [`ReconcileEvents`] sink; hosts
//! with multiple listeners (several webviews, SSE clients) register an
//! `EventBroadcaster` as that sink and subscribe as many receivers as
//! they need. Owned by the host session, never global.

use tokio::sync::broadcast;
use tracing::debug;

use super::McpEvent;
use crate::domain::Snapshot;
use crate::ports::ReconcileEvents;

/// Broadcast channel capacity for reconciliation events.
const CHANNEL_CAPACITY: usize = 64;

/// Fan-out adapter from the single-listener port to a broadcast channel.
pub struct EventBroadcaster {
    sender: broadcast::Sender<McpEvent>,
}

impl EventBroadcaster {
    /// Create a new broadcaster.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Broadcast an event to all subscribers.
    pub fn broadcast(&self, event: McpEvent) {
        // Only log if there are receivers (avoid spam in headless runs)
        if self.sender.receiver_count() > 0 {
            debug!(event = event.event_name(), "Broadcasting reconciliation event");
            let _ = self.sender.send(event);
        }
    }

    /// Subscribe to reconciliation events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<McpEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconcileEvents for EventBroadcaster {
    fn status_snapshot(&self, snapshot: &Snapshot) {
        self.broadcast(McpEvent::from_snapshot(snapshot));
    }

    fn poll_unavailable(&self, consecutive_failures: u32) {
        self.broadcast(McpEvent::PollUnavailable {
            consecutive_failures,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ServerRecord, ServerStatus};

    #[tokio::test]
    async fn test_subscribers_receive_snapshot_events() {
        let broadcaster = EventBroadcaster::new();
        let mut receiver = broadcaster.subscribe();

        let snapshot = Snapshot::new(vec![ServerRecord::from_cli(
            "memory",
            "npx memory",
            ServerStatus::Connected,
        )]);
        broadcaster.status_snapshot(&snapshot);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_name(), "mcp:status_snapshot");
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_a_no_op() {
        let broadcaster = EventBroadcaster::new();
        assert_eq!(broadcaster.subscriber_count(), 0);
        // Must not panic or block
        broadcaster.poll_unavailable(3);
    }
}
