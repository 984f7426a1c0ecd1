//! The polling reconciliation engine.
//!
//! Periodically runs the agent CLI's health listing, merges scope
//! metadata from the config resolver onto the parsed records, and
//! notifies the host only when the resulting snapshot actually differs
//! from the previous one. Repeated failures trip a circuit breaker that
//! suspends polling until an explicit restart.
//!
//! All poll state (timer handle, error counter, last snapshot) is owned
//! by one engine instance, constructed per host session and torn down
//! via [`ReconcileEngine::dispose`].

use std::sync::Arc;
use std::time::Duration;

use mcpdeck_core::config::ScopeResolver;
use mcpdeck_core::domain::{ServerRecord, Snapshot};
use mcpdeck_core::ports::{
    AgentCli, CommandError, DEFAULT_EXEC_TIMEOUT, ExecOptions, ReconcileEvents,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::status::parse_status_output;

/// Consecutive cycle failures that trip the circuit breaker.
pub const BREAKER_THRESHOLD: u32 = 3;

/// Default interval between ambient polling cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Subcommand producing the health listing.
const LIST_ARGS: &[&str] = &["mcp", "list"];

/// Errors surfaced by on-demand reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The agent CLI call failed after exhausting its retries.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The engine has been disposed and accepts no further work.
    #[error("Reconciliation engine has been disposed")]
    Disposed,
}

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Interval between ambient polling cycles.
    pub poll_interval: Duration,
    /// Consecutive failures that trip the breaker.
    pub breaker_threshold: u32,
    /// Time budget per CLI call, retries included.
    pub exec_timeout: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            breaker_threshold: BREAKER_THRESHOLD,
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
        }
    }
}

/// Observable engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    /// Not polling: never started, or stopped by request.
    Idle,
    /// Ambient timer armed and cycling.
    Polling,
    /// Breaker tripped; requires [`ReconcileEngine::restart_polling`].
    CircuitOpen,
}

/// Mutable poll state, owned by the engine.
#[derive(Default)]
struct PollState {
    /// Present iff polling is active; cancelling it stops the loop.
    cancel: Option<CancellationToken>,
    consecutive_errors: u32,
    last_snapshot: Option<Snapshot>,
    breaker_open: bool,
}

struct EngineInner {
    cli: Arc<dyn AgentCli>,
    resolver: Arc<ScopeResolver>,
    events: Arc<dyn ReconcileEvents>,
    config: ReconcileConfig,
    state: Mutex<PollState>,
    disposed: CancellationToken,
}

/// Polling state machine reconciling live MCP server status.
///
/// Cheap to clone; clones share the same state. Cycles triggered by the
/// ambient timer carry the timer's cancellation token so a cycle that
/// outlives a stop discards its result at emit time.
#[derive(Clone)]
pub struct ReconcileEngine {
    inner: Arc<EngineInner>,
}

impl ReconcileEngine {
    pub fn new(
        cli: Arc<dyn AgentCli>,
        resolver: Arc<ScopeResolver>,
        events: Arc<dyn ReconcileEvents>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                cli,
                resolver,
                events,
                config,
                state: Mutex::new(PollState::default()),
                disposed: CancellationToken::new(),
            }),
        }
    }

    /// Begin ambient polling: one immediate cycle, then a recurring
    /// timer.
    ///
    /// Idempotent while polling is active. A tripped breaker is not
    /// cleared here; that requires [`restart_polling`](Self::restart_polling).
    pub async fn start_polling(&self) {
        let token = {
            let mut state = self.inner.state.lock().await;
            if state.cancel.is_some() {
                debug!("Polling already active");
                return;
            }
            if state.breaker_open {
                debug!("Circuit open; polling requires an explicit restart");
                return;
            }
            let token = CancellationToken::new();
            state.cancel = Some(token.clone());
            token
        };

        info!(
            interval_secs = self.inner.config.poll_interval.as_secs(),
            "Starting MCP status polling"
        );

        let engine = self.clone();
        tokio::spawn(async move {
            engine.run_cycle(Some(&token), false).await;

            let period = engine.inner.config.poll_interval;
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    () = token.cancelled() => {
                        debug!("Poll loop cancelled");
                        break;
                    }
                    _ = ticker.tick() => engine.run_cycle(Some(&token), false).await,
                }
            }
        });
    }

    /// Cancel the ambient timer. Idempotent; the last snapshot stays
    /// readable for consumers wanting last-known state.
    pub async fn stop_polling(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(token) = state.cancel.take() {
            token.cancel();
            info!("MCP status polling stopped");
        }
    }

    /// Clear the breaker and error counter, then start polling afresh.
    pub async fn restart_polling(&self) {
        {
            let mut state = self.inner.state.lock().await;
            if let Some(token) = state.cancel.take() {
                token.cancel();
            }
            state.consecutive_errors = 0;
            state.breaker_open = false;
        }
        self.start_polling().await;
    }

    /// User-initiated full reconciliation.
    ///
    /// Bypasses fingerprint suppression (always notifies) and resets
    /// the error counter, independent of polling state. Failures
    /// propagate to the caller instead of feeding the breaker.
    pub async fn refresh_now(&self) -> Result<Snapshot, ReconcileError> {
        if self.inner.disposed.is_cancelled() {
            return Err(ReconcileError::Disposed);
        }
        let snapshot = self.observe().await?;

        let mut state = self.inner.state.lock().await;
        state.consecutive_errors = 0;
        if self.inner.disposed.is_cancelled() {
            return Err(ReconcileError::Disposed);
        }
        self.inner.events.status_snapshot(&snapshot);
        state.last_snapshot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// React to an external config-store change: drop the resolver's
    /// cache and, when polling, reconcile immediately instead of
    /// waiting out the current tick.
    pub async fn on_config_changed(&self) {
        self.inner.resolver.invalidate().await;
        let token = self.inner.state.lock().await.cancel.clone();
        if let Some(token) = token {
            let engine = self.clone();
            tokio::spawn(async move {
                engine.run_cycle(Some(&token), false).await;
            });
        }
    }

    /// Configured servers without a live health check ("list now").
    ///
    /// Resolver-only records with `unknown` status, sorted by full name
    /// for stable presentation.
    pub async fn list_configured(&self) -> Vec<ServerRecord> {
        let metadata = self.inner.resolver.resolve().await;
        let mut records: Vec<ServerRecord> = metadata
            .iter()
            .map(|(full_name, meta)| {
                ServerRecord::from_config(full_name.clone(), meta.scope, meta.config.clone())
            })
            .collect();
        records.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        records
    }

    /// Last successfully-recorded snapshot, surviving `stop_polling`.
    pub async fn last_snapshot(&self) -> Option<Snapshot> {
        self.inner.state.lock().await.last_snapshot.clone()
    }

    /// Current consecutive-failure count.
    pub async fn consecutive_errors(&self) -> u32 {
        self.inner.state.lock().await.consecutive_errors
    }

    /// Current phase of the polling state machine.
    pub async fn phase(&self) -> PollPhase {
        let state = self.inner.state.lock().await;
        if state.cancel.is_some() {
            PollPhase::Polling
        } else if state.breaker_open {
            PollPhase::CircuitOpen
        } else {
            PollPhase::Idle
        }
    }

    /// Tear the engine down: stop polling and refuse further work.
    pub async fn dispose(&self) {
        self.inner.disposed.cancel();
        self.stop_polling().await;
    }

    /// One reconciliation cycle. `origin` is the poll-loop token for
    /// timer-driven and out-of-band cycles, `None` for manual paths.
    async fn run_cycle(&self, origin: Option<&CancellationToken>, force_emit: bool) {
        match self.observe().await {
            Ok(snapshot) => self.commit(snapshot, origin, force_emit).await,
            Err(error) => self.record_failure(&error).await,
        }
    }

    /// Run the health listing and merge scope metadata onto the records.
    async fn observe(&self) -> Result<Snapshot, ReconcileError> {
        let args: Vec<String> = LIST_ARGS.iter().map(ToString::to_string).collect();
        let opts = ExecOptions::new(self.inner.config.exec_timeout);
        let raw = self.inner.cli.execute(&args, &opts).await?;

        let mut records = parse_status_output(&raw);
        let metadata = self.inner.resolver.resolve().await;
        for record in &mut records {
            // Match on the full identifier first, the short name second
            let meta = metadata
                .get(&record.full_name)
                .or_else(|| metadata.get(&record.name));
            if let Some(meta) = meta {
                record.scope = Some(meta.scope);
                if let Some(config) = &meta.config {
                    // Structured config beats the scraped invocation text
                    record.display_command = config.display_command();
                }
                record.config = meta.config.clone();
            }
        }
        Ok(Snapshot::new(records))
    }

    /// Record a successful cycle, notifying only on a real change.
    async fn commit(&self, snapshot: Snapshot, origin: Option<&CancellationToken>, force_emit: bool) {
        // Emit-time check: a cycle that outlived its poll loop or the
        // engine discards its result entirely
        if self.inner.disposed.is_cancelled()
            || origin.is_some_and(CancellationToken::is_cancelled)
        {
            debug!("Discarding reconciliation result after stop");
            return;
        }

        let mut state = self.inner.state.lock().await;
        state.consecutive_errors = 0;

        let fingerprint = snapshot.fingerprint();
        let changed = state
            .last_snapshot
            .as_ref()
            .is_none_or(|previous| previous.fingerprint() != fingerprint);

        if changed || force_emit {
            debug!(servers = snapshot.len(), "MCP status changed, notifying");
            self.inner.events.status_snapshot(&snapshot);
        } else {
            debug!("MCP status unchanged, suppressing notification");
        }
        state.last_snapshot = Some(snapshot);
    }

    /// Count a failed cycle and trip the breaker at the threshold.
    async fn record_failure(&self, error: &ReconcileError) {
        let mut state = self.inner.state.lock().await;
        state.consecutive_errors += 1;
        warn!(
            error = %error,
            consecutive = state.consecutive_errors,
            "Reconciliation cycle failed"
        );

        if state.consecutive_errors >= self.inner.config.breaker_threshold
            && state.cancel.is_some()
        {
            if let Some(token) = state.cancel.take() {
                token.cancel();
            }
            state.breaker_open = true;
            let failures = state.consecutive_errors;
            drop(state);

            warn!(
                failures,
                "Too many consecutive polling failures; suspending until restarted"
            );
            if !self.inner.disposed.is_cancelled() {
                self.inner.events.poll_unavailable(failures);
            }
        }
    }
}
