//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mcpdeck",
    version,
    about = "MCP server configuration and live status for agent CLIs"
)]
pub struct Cli {
    /// Agent CLI binary to shell out to
    #[arg(long, global = true, default_value = "claude", env = "MCPDECK_AGENT_BIN")]
    pub agent_bin: String,

    /// Workspace root for local/project scope resolution
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured servers, optionally with a live health check
    List {
        /// Run the agent CLI health check instead of listing config only
        #[arg(long)]
        health: bool,

        /// Emit records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Poll server status continuously, printing changes until Ctrl-C
    Watch {
        /// Seconds between polling cycles
        #[arg(long, default_value_t = 30)]
        interval: u64,

        /// Emit events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["mcpdeck", "list"]);
        assert_eq!(cli.agent_bin, "claude");
        assert!(cli.workspace.is_none());
    }
}
