//! Reconciliation snapshots and their change fingerprint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::server::ServerRecord;

/// Result of one reconciliation cycle: an ordered sequence of records.
///
/// Consumers receive owned copies via change notifications, never a live
/// reference into engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Records in the order the CLI listed them.
    pub records: Vec<ServerRecord>,
    /// When the cycle that produced this snapshot ran.
    pub checked_at: DateTime<Utc>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current time.
    #[must_use]
    pub fn new(records: Vec<ServerRecord>) -> Self {
        Self {
            records,
            checked_at: Utc::now(),
        }
    }

    /// Cheap deterministic digest for "did anything change" checks.
    ///
    /// Concatenates `fullName:status` pairs in sequence order. Two
    /// snapshots are equivalent iff their fingerprints match exactly.
    /// The digest is order-sensitive: if the underlying listing ever
    /// reorders records, the snapshots compare as different. The CLI
    /// lists servers in config order, which is stable between cycles,
    /// and a reordering is treated as a real change rather than masked
    /// by sorting here.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut parts = Vec::with_capacity(self.records.len());
        for record in &self.records {
            parts.push(format!("{}:{}", record.full_name, record.status));
        }
        parts.join("|")
    }

    /// Number of records in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::server::ServerStatus;

    fn record(full_name: &str, status: ServerStatus) -> ServerRecord {
        ServerRecord::from_cli(full_name, "npx server", status)
    }

    #[test]
    fn test_fingerprint_joins_name_status_pairs() {
        let snapshot = Snapshot::new(vec![
            record("memory", ServerStatus::Connected),
            record("plugin:tools:search", ServerStatus::Failed),
        ]);
        assert_eq!(
            snapshot.fingerprint(),
            "memory:connected|plugin:tools:search:failed"
        );
    }

    #[test]
    fn test_fingerprint_ignores_command_changes() {
        let mut a = record("memory", ServerStatus::Connected);
        a.display_command = "npx memory".to_string();
        let mut b = record("memory", ServerStatus::Connected);
        b.display_command = "node memory.js".to_string();

        assert_eq!(
            Snapshot::new(vec![a]).fingerprint(),
            Snapshot::new(vec![b]).fingerprint()
        );
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let first = Snapshot::new(vec![
            record("a", ServerStatus::Connected),
            record("b", ServerStatus::Connected),
        ]);
        let second = Snapshot::new(vec![
            record("b", ServerStatus::Connected),
            record("a", ServerStatus::Connected),
        ]);
        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_empty_snapshot_fingerprint() {
        let snapshot = Snapshot::new(Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.fingerprint(), "");
    }
}
