//! Level-based DCA decision layer.
//!
//! [`LevelController`] implements [`DecisionEngine`]: each tick it reads a
//! candle snapshot and the current price, discovers support/resistance
//! clusters, and reconciles the executor population per side:
//!
//! - **Refresh** — executors that never traded past the refresh age are
//!   stopped so their stale orders get cancelled and replaced.
//! - **Creation** — an empty slot is filled with a freshly built DCA plan,
//!   unless the slot terminated more recently than the cooldown.
//! - **Early stop** — an optional pluggable exit signal; defaults to none.
//! - **Store** — terminated executors beyond the retention buffer are handed
//!   to persistence, oldest first.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::Decimal;
use crate::execution::{
    DecisionEngine, ExecutionReport, ExecutorAction, ExecutorConfig, ExecutorInfo,
};
use crate::levels::{LevelDiscovery, discover};
use crate::market::MarketDataProvider;
use crate::types::error::{LMError, LMResult};
use crate::types::{PriceKind, Side};

use super::config::{ControllerConfigUpdate, LevelControllerConfig};
use super::ladder::build_dca_config;

type EarlyStopSignal = Box<dyn Fn(&ExecutorInfo) -> bool + Send + Sync>;

/// Strategy controller that turns discovered price levels into executor
/// lifecycle actions.
pub struct LevelController {
    config: LevelControllerConfig,
    provider: Arc<dyn MarketDataProvider>,
    early_stop_signal: Option<EarlyStopSignal>,
    last_reference_price: Option<Decimal>,
    last_discovery: Option<LevelDiscovery>,
}

impl LevelController {
    /// Creates a controller over a validated configuration.
    #[must_use]
    pub fn new(config: LevelControllerConfig, provider: Arc<dyn MarketDataProvider>) -> Self {
        Self {
            config,
            provider,
            early_stop_signal: None,
            last_reference_price: None,
            last_discovery: None,
        }
    }

    /// Installs a strategy-specific early-stop signal.
    ///
    /// The predicate is evaluated against every active executor each tick;
    /// a `true` result emits a stop for that executor.
    #[must_use]
    pub fn with_early_stop_signal(
        mut self,
        signal: impl Fn(&ExecutorInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.early_stop_signal = Some(Box::new(signal));
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LevelControllerConfig {
        &self.config
    }

    /// Applies a hot reload to the configuration's reloadable subset.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] and leaves the configuration
    /// unchanged when the update fails validation.
    pub fn hot_reload(&mut self, update: ControllerConfigUpdate) -> LMResult<()> {
        self.config.hot_reload(update)
    }

    /// Store candidates: terminated executors beyond the newest
    /// `retention_buffer`, oldest first.
    fn store_actions(&self, report: &ExecutionReport) -> Vec<ExecutorAction> {
        let mut closed: Vec<&ExecutorInfo> = report
            .closed
            .iter()
            .filter(|info| info.trading_pair == self.config.trading_pair)
            .collect();
        closed.sort_by_key(|info| std::cmp::Reverse(info.close_timestamp));

        closed
            .iter()
            .skip(self.config.retention_buffer)
            .map(|info| ExecutorAction::Store(info.id.clone()))
            .collect()
    }

    fn side_actions(
        &self,
        side: Side,
        report: &ExecutionReport,
        reference_price: Decimal,
        discovery: &LevelDiscovery,
        price_range: Decimal,
    ) -> LMResult<Vec<ExecutorAction>> {
        let now = report.timestamp;
        let active = report.active_for(side, &self.config.trading_pair);
        let mut actions = Vec::new();
        let mut stopped: HashSet<&str> = HashSet::new();

        // Refresh: never-filled executors past the refresh age are stopped
        // and replaced next tick rather than left pending indefinitely.
        for info in &active {
            if !info.is_trading() && info.age_ms(now) >= self.config.order_refresh_time {
                debug!(executor_id = %info.id, %side, "refreshing stale executor");
                stopped.insert(info.id.as_str());
                actions.push(ExecutorAction::Stop(info.id.clone()));
            }
        }

        if let Some(signal) = &self.early_stop_signal {
            for info in &active {
                if !stopped.contains(info.id.as_str()) && signal(*info) {
                    debug!(executor_id = %info.id, %side, "early stop signal fired");
                    actions.push(ExecutorAction::Stop(info.id.clone()));
                }
            }
        }

        // Creation: one pending plan per side at most. Executors stopped
        // above remain active until they terminate, so the slot stays
        // occupied for the rest of this tick.
        if active.is_empty() {
            let cooled = report
                .latest_close_timestamp(side, &self.config.trading_pair)
                .is_none_or(|closed_at| now.saturating_sub(closed_at) >= self.config.cooldown_time);

            if !cooled {
                debug!(%side, "slot cooling down");
            } else {
                match build_dca_config(
                    side,
                    reference_price,
                    discovery,
                    price_range,
                    &self.config,
                    now,
                ) {
                    Ok(plan) => {
                        debug!(executor_id = %plan.id, %side, levels = plan.prices.len(), "proposing executor");
                        actions.push(ExecutorAction::Create(Box::new(ExecutorConfig::Dca(plan))));
                    }
                    Err(LMError::InsufficientLevels(reason))
                    | Err(LMError::DegenerateAllocation(reason)) => {
                        debug!(%side, %reason, "skipping creation this tick");
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        Ok(actions)
    }
}

#[async_trait]
impl DecisionEngine for LevelController {
    async fn determine_actions(
        &mut self,
        report: &ExecutionReport,
    ) -> LMResult<Vec<ExecutorAction>> {
        if !self.provider.ready() {
            debug!("market data provider not ready");
            return Ok(Vec::new());
        }

        let series = self
            .provider
            .candles(
                &self.config.exchange,
                &self.config.trading_pair,
                &self.config.interval,
                self.config.cluster_window,
            )
            .await?;
        let reference_price = self
            .provider
            .price(
                &self.config.exchange,
                &self.config.trading_pair,
                PriceKind::Mid,
            )
            .await?;

        let discovery = discover(
            &series,
            self.config.cluster_prominence,
            self.config.cluster_spacing,
            self.config.cluster_count(),
        )?;
        let price_range = series.price_range();

        self.last_reference_price = Some(reference_price);
        self.last_discovery = Some(discovery.clone());

        let mut actions = Vec::new();
        for side in [Side::Buy, Side::Sell] {
            actions.extend(self.side_actions(
                side,
                report,
                reference_price,
                &discovery,
                price_range,
            )?);
        }
        actions.extend(self.store_actions(report));

        Ok(actions)
    }

    fn format_status(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Level controller | {} | {} | interval: {}",
            self.config.exchange, self.config.trading_pair, self.config.interval
        )];

        match (&self.last_reference_price, &self.last_discovery) {
            (Some(price), Some(discovery)) => {
                lines.push(format!(
                    "reference: {} | clusters high: {} | clusters low: {}",
                    price,
                    discovery.high_clusters.len(),
                    discovery.low_clusters.len()
                ));
            }
            _ => lines.push("awaiting first discovery".to_string()),
        }

        lines
    }
}
