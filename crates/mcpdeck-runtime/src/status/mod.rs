//! Structured records out of the CLI's human-oriented status listing.

mod parser;

pub use parser::{HEALTH_BANNER, parse_status_output, strip_ansi};
