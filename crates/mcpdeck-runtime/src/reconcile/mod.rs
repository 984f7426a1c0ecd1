//! Live-status reconciliation: polling, suppression, circuit breaking.

mod engine;

pub use engine::{
    BREAKER_THRESHOLD, DEFAULT_POLL_INTERVAL, PollPhase, ReconcileConfig, ReconcileEngine,
    ReconcileError,
};
