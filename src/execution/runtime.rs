//! Traits at the seams of the lifecycle orchestrator.
//!
//! The orchestrator never owns strategy logic or executor internals; it is
//! wired from the outside with:
//!
//! - a [`DecisionEngine`] that turns a snapshot [`ExecutionReport`] into
//!   [`ExecutorAction`]s,
//! - an [`ExecutorFactory`] that instantiates concrete [`ExecutorRuntime`]
//!   workers from configurations.
//!
//! Executor runtimes are independent concurrent units: the orchestrator only
//! calls `start`, requests cooperative `early_stop`, and reads `info`
//! snapshots. It never mutates an executor's internal state directly.

use async_trait::async_trait;

use crate::types::Side;
use crate::types::error::LMResult;

use super::executor::{ExecutorAction, ExecutorConfig, ExecutorInfo};

/// A running executor: one worker owning the lifecycle of one order plan.
#[async_trait]
pub trait ExecutorRuntime: Send + Sync {
    /// Starts the worker. Called exactly once, before any other call.
    async fn start(&mut self) -> LMResult<()>;

    /// Requests a cooperative stop.
    ///
    /// Best-effort and asynchronous: the executor reaches `Terminated` on its
    /// own schedule. Must be safe to call repeatedly and safe to call while
    /// the executor terminates on its own.
    fn early_stop(&self);

    /// Returns a read-only snapshot of the executor's state.
    fn info(&self) -> ExecutorInfo;
}

/// Instantiates concrete executor runtimes from configurations.
pub trait ExecutorFactory: Send + Sync {
    /// Creates a runtime for the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::ExecutorRuntime`](crate::types::error::LMError)
    /// when the worker cannot be instantiated.
    fn create(&self, config: ExecutorConfig) -> LMResult<Box<dyn ExecutorRuntime>>;
}

/// Immutable snapshot of every live and recently closed executor, taken once
/// per tick.
///
/// All decisions within a tick are computed against this one consistent view.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// Snapshot timestamp in milliseconds; the tick's notion of "now".
    pub timestamp: u64,
    /// Executors that have not terminated.
    pub active: Vec<ExecutorInfo>,
    /// Terminated executors not yet stored.
    pub closed: Vec<ExecutorInfo>,
}

impl ExecutionReport {
    /// Creates an empty report for the given timestamp.
    #[must_use]
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            active: Vec::new(),
            closed: Vec::new(),
        }
    }

    /// Active executors of one side for one trading pair.
    #[must_use]
    pub fn active_for(&self, side: Side, trading_pair: &str) -> Vec<&ExecutorInfo> {
        self.active
            .iter()
            .filter(|info| info.side == side && info.trading_pair == trading_pair)
            .collect()
    }

    /// Closed executors of one side for one trading pair.
    #[must_use]
    pub fn closed_for(&self, side: Side, trading_pair: &str) -> Vec<&ExecutorInfo> {
        self.closed
            .iter()
            .filter(|info| info.side == side && info.trading_pair == trading_pair)
            .collect()
    }

    /// Most recent termination timestamp of one side for one trading pair.
    #[must_use]
    pub fn latest_close_timestamp(&self, side: Side, trading_pair: &str) -> Option<u64> {
        self.closed_for(side, trading_pair)
            .iter()
            .filter_map(|info| info.close_timestamp)
            .max()
    }
}

/// Strategy layer injected into the orchestrator.
///
/// Implementations evaluate one snapshot per tick and emit the full set of
/// state-changing actions for that tick.
#[async_trait]
pub trait DecisionEngine: Send + Sync {
    /// Computes the actions for one tick against a consistent snapshot.
    ///
    /// # Errors
    ///
    /// [`LMError::MarketDataUnavailable`](crate::types::error::LMError) makes
    /// the orchestrator skip the tick entirely; other errors abort the tick.
    async fn determine_actions(&mut self, report: &ExecutionReport)
    -> LMResult<Vec<ExecutorAction>>;

    /// Human-readable status lines for this component.
    fn format_status(&self) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dec;
    use crate::execution::executor::{
        DcaExecutorConfig, ExecutorConfig, ExecutorInfo, RunStatus, TrailingStop,
    };

    fn info(id: &str, side: Side, status: RunStatus, close_timestamp: Option<u64>) -> ExecutorInfo {
        let config = ExecutorConfig::Dca(DcaExecutorConfig {
            id: id.to_string(),
            timestamp: 1000,
            exchange: "binance_perpetual".to_string(),
            trading_pair: "BTC-USDT".to_string(),
            side,
            leverage: 10,
            prices: vec![dec!(100)],
            amounts_quote: vec![dec!(1000)],
            stop_loss_pct: dec!(0.03),
            take_profit_pct: dec!(0.02),
            time_limit: 1000,
            trailing_stop: TrailingStop::new(dec!(0.05), dec!(0.005)),
            activation_bounds: None,
        });
        let mut info = ExecutorInfo::from_config(config);
        info.status = status;
        info.close_timestamp = close_timestamp;
        info
    }

    #[test]
    fn test_report_filters_by_side_and_pair() {
        let mut report = ExecutionReport::new(5000);
        report.active.push(info("a", Side::Buy, RunStatus::Active, None));
        report.active.push(info("b", Side::Sell, RunStatus::Trading, None));

        assert_eq!(report.active_for(Side::Buy, "BTC-USDT").len(), 1);
        assert_eq!(report.active_for(Side::Sell, "BTC-USDT").len(), 1);
        assert!(report.active_for(Side::Buy, "ETH-USDT").is_empty());
    }

    #[test]
    fn test_latest_close_timestamp() {
        let mut report = ExecutionReport::new(5000);
        report
            .closed
            .push(info("a", Side::Buy, RunStatus::Terminated, Some(2000)));
        report
            .closed
            .push(info("b", Side::Buy, RunStatus::Terminated, Some(4000)));
        report
            .closed
            .push(info("c", Side::Sell, RunStatus::Terminated, Some(4500)));

        assert_eq!(report.latest_close_timestamp(Side::Buy, "BTC-USDT"), Some(4000));
        assert_eq!(report.latest_close_timestamp(Side::Sell, "BTC-USDT"), Some(4500));
        assert_eq!(report.latest_close_timestamp(Side::Buy, "ETH-USDT"), None);
    }
}
