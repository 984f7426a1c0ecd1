//! Port definitions: the seams between core, runtime, and hosts.

mod agent_cli;
mod events;
mod plugins;

pub use agent_cli::{AgentCli, CommandError, DEFAULT_EXEC_TIMEOUT, ExecOptions};
pub use events::{NoopReconcileEvents, ReconcileEvents};
pub use plugins::{InstalledPlugin, PluginCatalog, StaticPluginCatalog};

#[cfg(test)]
pub use plugins::MockPluginCatalog;
