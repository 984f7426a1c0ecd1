//! Canonical event union for host-facing notifications.
//!
//! The reconciliation engine drives the [`crate::ports::ReconcileEvents`]
//! port; this module defines the wire representation of those
//! notifications for hosts that transport them (webview bridge, SSE,
//! stdout), plus a broadcast-backed fan-out for multi-listener hosts.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag for TypeScript compatibility:
//!
//! ```json
//! { "type": "status_snapshot", "servers": [...], "checkedAt": "..." }
//! ```

mod broadcaster;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ServerRecord, Snapshot};

pub use broadcaster::EventBroadcaster;

/// Canonical notification types emitted by the reconciliation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum McpEvent {
    /// Full status snapshot after a cycle observed a real change.
    StatusSnapshot {
        /// Records in CLI listing order.
        servers: Vec<ServerRecord>,
        /// When the producing cycle ran.
        #[serde(rename = "checkedAt")]
        checked_at: DateTime<Utc>,
    },

    /// Polling self-suspended after repeated failures; an explicit
    /// restart is required.
    PollUnavailable {
        /// Failure count that tripped the breaker.
        #[serde(rename = "consecutiveFailures")]
        consecutive_failures: u32,
    },
}

impl McpEvent {
    /// Get the event name for wire protocols.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::StatusSnapshot { .. } => "mcp:status_snapshot",
            Self::PollUnavailable { .. } => "mcp:poll_unavailable",
        }
    }

    /// Build a snapshot event from an engine snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self::StatusSnapshot {
            servers: snapshot.records.clone(),
            checked_at: snapshot.checked_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServerStatus;

    #[test]
    fn test_event_serialization() {
        let snapshot = Snapshot::new(vec![ServerRecord::from_cli(
            "memory",
            "npx memory",
            ServerStatus::Connected,
        )]);
        let json = serde_json::to_string(&McpEvent::from_snapshot(&snapshot)).unwrap();
        assert!(json.contains("\"type\":\"status_snapshot\""));
        assert!(json.contains("\"checkedAt\""));
        assert!(json.contains("\"fullName\":\"memory\""));
    }

    /// Lock down event names to prevent host subscription mismatches.
    #[test]
    fn test_event_names_are_stable() {
        let snapshot = Snapshot::new(Vec::new());
        assert_eq!(
            McpEvent::from_snapshot(&snapshot).event_name(),
            "mcp:status_snapshot"
        );
        assert_eq!(
            McpEvent::PollUnavailable {
                consecutive_failures: 3
            }
            .event_name(),
            "mcp:poll_unavailable"
        );
    }
}
