//! Subprocess execution of the agent CLI.

mod runner;

pub use runner::{BASE_BACKOFF, CommandRunner, MAX_OUTPUT_BYTES, MAX_RETRIES, backoff_for};
