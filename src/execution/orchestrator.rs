//! Executor lifecycle orchestrator.
//!
//! The orchestrator owns the registry of live executors and drives a
//! fixed-period reconciliation tick:
//!
//! 1. **Snapshot** — read every executor's [`ExecutorInfo`] into one
//!    [`ExecutionReport`]; all decisions in the tick see this consistent view.
//! 2. **Decide** — delegate to the injected [`DecisionEngine`].
//! 3. **Apply** — execute the returned actions in emission order, each
//!    all-or-nothing, before the next snapshot is taken.
//!
//! The registry has a single writer (the apply phase); executors run as
//! independent workers that the orchestrator only starts, cooperatively
//! stops, and reads.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut orchestrator = ExecutorOrchestrator::new(
//!     OrchestratorConfig::new("BTC-USDT"),
//!     Box::new(controller),
//!     Box::new(factory),
//!     Arc::new(repository),
//!     Arc::new(connector),
//! );
//!
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! orchestrator.run(shutdown_rx).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::market::ExchangeConnector;
use crate::persistence::ExecutorRepository;
use crate::types::PositionMode;
use crate::types::error::{LMError, LMResult};

use super::executor::{ExecutorAction, ExecutorInfo, RunStatus};
use super::runtime::{DecisionEngine, ExecutionReport, ExecutorFactory, ExecutorRuntime};

/// Orchestrator scheduling and bootstrap parameters.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Trading pair the orchestrator manages.
    pub trading_pair: String,
    /// Reconciliation tick period.
    pub update_interval: Duration,
    /// Whether the market is a leveraged/perpetual market.
    pub is_perpetual: bool,
    /// Leverage applied once at bootstrap on perpetual markets.
    pub leverage: u32,
    /// Position mode applied once at bootstrap on perpetual markets.
    pub position_mode: PositionMode,
}

impl OrchestratorConfig {
    /// Creates a configuration with a one-second tick for a spot market.
    #[must_use]
    pub fn new(trading_pair: impl Into<String>) -> Self {
        Self {
            trading_pair: trading_pair.into(),
            update_interval: Duration::from_secs(1),
            is_perpetual: false,
            leverage: 1,
            position_mode: PositionMode::default(),
        }
    }

    /// Sets the tick period.
    #[must_use]
    pub fn with_update_interval(mut self, update_interval: Duration) -> Self {
        self.update_interval = update_interval;
        self
    }

    /// Marks the market as perpetual and sets the bootstrap parameters.
    #[must_use]
    pub fn with_perpetual(mut self, leverage: u32, position_mode: PositionMode) -> Self {
        self.is_perpetual = true;
        self.leverage = leverage;
        self.position_mode = position_mode;
        self
    }
}

/// Registry statistics, by lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorStats {
    /// Total executors in the registry.
    pub total: usize,
    /// Executors created but not yet started into `Active`.
    pub created: usize,
    /// Executors started but not yet trading.
    pub active: usize,
    /// Executors with at least one order live or filled.
    pub trading: usize,
    /// Terminated executors retained in memory.
    pub terminated: usize,
}

/// Executor lifecycle orchestrator.
///
/// Owns the live-executor registry keyed by executor id and applies the
/// decision layer's actions exactly once per tick.
pub struct ExecutorOrchestrator {
    config: OrchestratorConfig,
    controller: Box<dyn DecisionEngine>,
    factory: Box<dyn ExecutorFactory>,
    repository: Arc<dyn ExecutorRepository>,
    connector: Arc<dyn ExchangeConnector>,
    executors: HashMap<String, Box<dyn ExecutorRuntime>>,
    markets_initialized: bool,
}

impl ExecutorOrchestrator {
    /// Creates a new orchestrator wired to its collaborators.
    #[must_use]
    pub fn new(
        config: OrchestratorConfig,
        controller: Box<dyn DecisionEngine>,
        factory: Box<dyn ExecutorFactory>,
        repository: Arc<dyn ExecutorRepository>,
        connector: Arc<dyn ExchangeConnector>,
    ) -> Self {
        Self {
            config,
            controller,
            factory,
            repository,
            connector,
            executors: HashMap::new(),
            markets_initialized: false,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Returns the number of executors in the registry.
    #[must_use]
    pub fn executor_count(&self) -> usize {
        self.executors.len()
    }

    /// Returns a snapshot of one executor, if registered.
    #[must_use]
    pub fn executor_info(&self, executor_id: &str) -> Option<ExecutorInfo> {
        self.executors.get(executor_id).map(|e| e.info())
    }

    /// One-time market bootstrap: position mode and leverage on perpetual
    /// markets. Idempotent across ticks via an internal flag.
    pub async fn on_start(&mut self) -> LMResult<()> {
        if !self.config.is_perpetual || self.markets_initialized {
            return Ok(());
        }

        self.connector
            .set_position_mode(self.config.position_mode)
            .await?;
        self.connector
            .set_leverage(&self.config.trading_pair, self.config.leverage)
            .await?;
        self.markets_initialized = true;
        debug!(
            trading_pair = %self.config.trading_pair,
            leverage = self.config.leverage,
            "perpetual market initialized"
        );

        Ok(())
    }

    /// Takes the tick snapshot: one consistent view of every executor.
    #[must_use]
    pub fn report(&self, now: u64) -> ExecutionReport {
        let mut report = ExecutionReport::new(now);
        for executor in self.executors.values() {
            let info = executor.info();
            if info.is_closed() {
                report.closed.push(info);
            } else {
                report.active.push(info);
            }
        }
        report
    }

    /// Runs one reconciliation tick: snapshot, decide, apply.
    ///
    /// An unavailable data provider skips the decision phase entirely; the
    /// orchestrator retries next tick.
    ///
    /// # Errors
    ///
    /// Propagates decision or apply errors other than the recoverable
    /// per-action classes; a propagated error aborts this tick only.
    pub async fn tick(&mut self, now: u64) -> LMResult<()> {
        self.on_start().await?;

        let report = self.report(now);
        let actions = match self.controller.determine_actions(&report).await {
            Ok(actions) => actions,
            Err(LMError::MarketDataUnavailable(reason)) => {
                debug!(%reason, "market data unavailable, skipping tick");
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        self.apply_actions(actions).await
    }

    /// Applies actions in emission order.
    ///
    /// An [`LMError::InvalidActionTarget`] drops the single offending action
    /// and continues; any other error aborts the remainder of the tick. No
    /// action is ever partially applied.
    pub async fn apply_actions(&mut self, actions: Vec<ExecutorAction>) -> LMResult<()> {
        for action in actions {
            match self.apply_action(action).await {
                Ok(()) => {}
                Err(LMError::InvalidActionTarget(reason)) => {
                    warn!(%reason, "action dropped");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    async fn apply_action(&mut self, action: ExecutorAction) -> LMResult<()> {
        match action {
            ExecutorAction::Create(config) => {
                let executor_id = config.id().to_string();
                if self.executors.contains_key(&executor_id) {
                    return Err(LMError::InvalidActionTarget(format!(
                        "executor {executor_id} already registered"
                    )));
                }

                let mut executor = self.factory.create(*config)?;
                executor.start().await?;
                debug!(executor_id = %executor_id, "executor created and started");
                self.executors.insert(executor_id, executor);
            }
            ExecutorAction::Stop(executor_id) => {
                // Idempotent: unknown or already-closed targets are no-ops.
                if let Some(executor) = self.executors.get(&executor_id)
                    && executor.info().is_active()
                {
                    executor.early_stop();
                    debug!(executor_id = %executor_id, "early stop requested");
                }
            }
            ExecutorAction::Store(executor_id) => {
                let Some(executor) = self.executors.get(&executor_id) else {
                    // Idempotent: the executor may have been stored already.
                    return Ok(());
                };

                let mut info = executor.info();
                if !info.is_closed() {
                    return Err(LMError::InvalidActionTarget(format!(
                        "executor {executor_id} is not terminated"
                    )));
                }

                info.status = RunStatus::Stored;
                self.repository.store_executor(&info).await?;
                self.executors.remove(&executor_id);
                debug!(executor_id = %executor_id, "executor stored and evicted");
            }
        }
        Ok(())
    }

    /// Requests a cooperative stop of every live executor.
    pub fn stop_all_executors(&self) {
        for executor in self.executors.values() {
            if executor.info().is_active() {
                executor.early_stop();
            }
        }
    }

    /// Drives the fixed-period tick loop until shutdown is signalled, then
    /// early-stops every live executor.
    ///
    /// Ticks never overlap: each tick completes before the next interval
    /// fires, and a slow tick skips missed periods instead of bursting.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> LMResult<()> {
        let mut interval = tokio::time::interval(self.config.update_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    match changed {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                debug!("shutdown signal received");
                                break;
                            }
                        }
                        Err(_) => {
                            debug!("shutdown channel closed");
                            break;
                        }
                    }
                }
                _ = interval.tick() => {
                    let now = current_timestamp_ms();
                    if let Err(err) = self.tick(now).await {
                        warn!(error = %err, "tick aborted");
                    }
                }
            }
        }

        self.stop_all_executors();
        Ok(())
    }

    /// Registry statistics by lifecycle state.
    #[must_use]
    pub fn stats(&self) -> OrchestratorStats {
        let mut stats = OrchestratorStats::default();
        for executor in self.executors.values() {
            stats.total += 1;
            match executor.info().status {
                RunStatus::Created => stats.created += 1,
                RunStatus::Active => stats.active += 1,
                RunStatus::Trading => stats.trading += 1,
                RunStatus::Terminated | RunStatus::Stored => stats.terminated += 1,
            }
        }
        stats
    }

    /// Assembles the status report: controller lines first, then the
    /// orchestrator's own registry summary.
    #[must_use]
    pub fn format_status(&self) -> String {
        let mut lines = self.controller.format_status();
        let stats = self.stats();
        lines.push(format!(
            "Executors | total: {} | created: {} | active: {} | trading: {} | terminated: {}",
            stats.total, stats.created, stats.active, stats.trading, stats.terminated
        ));
        lines.join("\n")
    }
}

/// Returns the current timestamp in milliseconds.
fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
