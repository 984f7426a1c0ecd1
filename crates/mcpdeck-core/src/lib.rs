//! Core domain types and port definitions for mcpdeck.
//!
//! This crate holds everything the runtime and host adapters share:
//! the server/snapshot domain model, the four-store configuration
//! merge, the host-facing event types, and the ports (traits) the
//! runtime implements. It contains no subprocess or transport code.

pub mod config;
pub mod domain;
pub mod events;
pub mod ports;

// Re-export commonly used types for convenience
pub use config::{
    ConfigError, FsSourceReader, ScopeMeta, ScopeMetadataMap, ScopeResolver, SourceReader,
    WorkspaceContext,
};
pub use domain::{
    ServerConfig, ServerRecord, ServerScope, ServerStatus, Snapshot, plugin_full_name, short_name,
};
pub use events::{EventBroadcaster, McpEvent};
pub use ports::{
    AgentCli, CommandError, DEFAULT_EXEC_TIMEOUT, ExecOptions, InstalledPlugin,
    NoopReconcileEvents, PluginCatalog, ReconcileEvents, StaticPluginCatalog,
};

// Silence unused dev-dependency warnings until more mock-based tests land
#[cfg(test)]
use tokio_test as _;
