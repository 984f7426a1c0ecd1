//! CLI entry point - the composition root.
//!
//! This is the only place where the runtime is wired into the core
//! ports: filesystem config reader, subprocess command runner, stdout
//! event sink. Everything else talks through traits.

mod events;
mod parser;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mcpdeck_core::config::{FsSourceReader, ScopeResolver, SourceReader, WorkspaceContext};
use mcpdeck_core::ports::{AgentCli, NoopReconcileEvents, ReconcileEvents, StaticPluginCatalog};
use mcpdeck_runtime::{CommandRunner, ReconcileConfig, ReconcileEngine};

use events::{StdoutEvents, print_records};
use parser::{Cli, Commands};

fn init_tracing(verbose: u8) {
    let default_directive = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_engine(cli: &Cli, events: Arc<dyn ReconcileEvents>, config: ReconcileConfig) -> anyhow::Result<ReconcileEngine> {
    let reader = Arc::new(FsSourceReader::new()?) as Arc<dyn SourceReader>;
    let resolver = Arc::new(ScopeResolver::new(
        reader,
        Arc::new(StaticPluginCatalog::empty()),
        WorkspaceContext::new(cli.workspace.clone()),
    ));
    let runner = Arc::new(CommandRunner::new(cli.agent_bin.clone())) as Arc<dyn AgentCli>;
    Ok(ReconcileEngine::new(runner, resolver, events, config))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::List { health, json } => {
            let engine =
                build_engine(&cli, Arc::new(NoopReconcileEvents), ReconcileConfig::default())?;
            let records = if *health {
                engine.refresh_now().await?.records
            } else {
                engine.list_configured().await
            };
            print_records(&records, *json)?;
        }
        Commands::Watch { interval, json } => {
            let config = ReconcileConfig {
                poll_interval: Duration::from_secs((*interval).max(1)),
                ..ReconcileConfig::default()
            };
            let engine = build_engine(&cli, Arc::new(StdoutEvents::new(*json)), config)?;
            engine.start_polling().await;
            tokio::signal::ctrl_c().await?;
            engine.dispose().await;
        }
    }

    Ok(())
}
