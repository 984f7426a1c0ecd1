//! Stdout event sink and record presentation.

use mcpdeck_core::domain::{ServerRecord, Snapshot};
use mcpdeck_core::events::McpEvent;
use mcpdeck_core::ports::ReconcileEvents;
use tracing::error;

/// Prints reconciliation events to stdout, human-readable or as JSON
/// lines.
pub struct StdoutEvents {
    json: bool,
}

impl StdoutEvents {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }
}

impl ReconcileEvents for StdoutEvents {
    fn status_snapshot(&self, snapshot: &Snapshot) {
        if self.json {
            match serde_json::to_string(&McpEvent::from_snapshot(snapshot)) {
                Ok(line) => println!("{line}"),
                Err(e) => error!(error = %e, "Failed to serialize snapshot event"),
            }
            return;
        }
        println!("[{}] {} server(s):", snapshot.checked_at.format("%H:%M:%S"), snapshot.len());
        print_record_table(&snapshot.records);
    }

    fn poll_unavailable(&self, consecutive_failures: u32) {
        if self.json {
            let event = McpEvent::PollUnavailable {
                consecutive_failures,
            };
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{line}");
            }
            return;
        }
        eprintln!(
            "Status polling unavailable after {consecutive_failures} consecutive failures; restart to retry"
        );
    }
}

/// Print records as an aligned table.
pub fn print_record_table(records: &[ServerRecord]) {
    for record in records {
        let scope = record
            .scope
            .map_or_else(|| "-".to_string(), |scope| scope.to_string());
        println!(
            "  {:<32} {:<12} {:<9} {}",
            record.full_name,
            record.status.as_str(),
            scope,
            record.display_command
        );
    }
}

/// Print records either as a table or as a JSON document.
pub fn print_records(records: &[ServerRecord], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
    } else {
        print_record_table(records);
    }
    Ok(())
}
