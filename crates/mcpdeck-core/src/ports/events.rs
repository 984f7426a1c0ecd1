//! Outbound notification port for the reconciliation engine.

use crate::domain::Snapshot;

/// Port for delivering reconciliation notifications to the host.
///
/// This trait decouples the engine from transport-specific event
/// delivery (webview bridges, SSE, stdout). Implementations convert the
/// snapshot to their native event format.
///
/// # Design
///
/// - **Object-safe**: `&self` methods for dispatch via `Arc<dyn ReconcileEvents>`
/// - **Fire-and-forget**: no `Result`, no queueing, no backpressure; a
///   slow listener does not delay the next cycle
/// - **Single listener**: one registered sink per engine; fan-out to
///   multiple listeners is an adapter concern (see
///   [`crate::events::EventBroadcaster`])
pub trait ReconcileEvents: Send + Sync {
    /// Called with the full snapshot when a cycle observed a real change
    /// (or on a forced refresh).
    fn status_snapshot(&self, snapshot: &Snapshot);

    /// Called exactly once when the circuit breaker trips; polling has
    /// self-suspended and requires an explicit restart.
    fn poll_unavailable(&self, consecutive_failures: u32);
}

/// No-op implementation for tests and headless contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReconcileEvents;

impl ReconcileEvents for NoopReconcileEvents {
    fn status_snapshot(&self, _snapshot: &Snapshot) {}
    fn poll_unavailable(&self, _consecutive_failures: u32) {}
}
