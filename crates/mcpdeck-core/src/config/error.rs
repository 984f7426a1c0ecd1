//! Configuration store error types.
//!
//! A missing store file is not an error (stores are optional); these
//! variants cover the cases callers must be able to tell apart: an
//! unreadable file, and a file that exists but is not valid JSON.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while locating or reading a config store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not determine the user's home directory.
    #[error("Cannot determine home directory")]
    NoHomeDir,

    /// Failed to read an existing store file.
    #[error("Failed to read config store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A store file exists but does not parse as JSON.
    ///
    /// Surfaced distinctly from a missing file so callers can decide
    /// whether a malformed source aborts the operation or merely
    /// contributes nothing.
    #[error("Malformed JSON in config store {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Whether this error means a store was present but unparseable.
    #[must_use]
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
