//! Agent CLI runtime for mcpdeck.
//!
//! OS-level concerns live here: spawning the agent CLI with bounded
//! retries, parsing its status listing, and the polling reconciliation
//! engine. Everything reaches the rest of the system through the ports
//! defined in `mcpdeck-core`.

pub mod cli;
pub mod reconcile;
pub mod status;

pub use cli::CommandRunner;
pub use reconcile::{PollPhase, ReconcileConfig, ReconcileEngine, ReconcileError};
pub use status::parse_status_output;
