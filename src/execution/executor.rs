//! Executor configuration, runtime projection and action types.
//!
//! An [`ExecutorConfig`] fully parameterizes one order-management plan. It is
//! produced by the strategy layer, consumed exactly once to instantiate a
//! worker, and immutable for the worker's life. The worker reports itself
//! through [`ExecutorInfo`] snapshots, and the orchestrator steers the
//! population through [`ExecutorAction`] commands.
//!
//! All three are closed enums matched exhaustively: adding a new executor or
//! action kind is a compile-time event, not a runtime branch.

use crate::Decimal;
use crate::types::Side;
use crate::types::error::{LMError, LMResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trailing stop parameters.
///
/// The stop activates once price moves `activation_pct` in the plan's favor
/// and then trails at `trailing_delta_pct`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrailingStop {
    /// Favorable move that arms the trailing stop, as a fraction of the
    /// reference price.
    pub activation_pct: Decimal,
    /// Trailing distance once armed, as a fraction of price.
    pub trailing_delta_pct: Decimal,
}

impl TrailingStop {
    /// Creates new trailing stop parameters.
    #[must_use]
    pub fn new(activation_pct: Decimal, trailing_delta_pct: Decimal) -> Self {
        Self {
            activation_pct,
            trailing_delta_pct,
        }
    }
}

/// Configuration for a multi-level DCA executor.
///
/// `prices[0]` is the immediate entry; the remaining levels scale in at
/// progressively worse prices. `amounts_quote` carries the quote-currency
/// slice for each level.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DcaExecutorConfig {
    /// Unique executor identifier.
    pub id: String,
    /// Creation timestamp in milliseconds.
    pub timestamp: u64,
    /// Exchange the plan trades on.
    pub exchange: String,
    /// Trading pair the plan trades.
    pub trading_pair: String,
    /// Plan side.
    pub side: Side,
    /// Leverage applied on perpetual markets.
    pub leverage: u32,
    /// Ladder prices, entry first, ordered away from the entry in the
    /// direction of adverse price movement.
    pub prices: Vec<Decimal>,
    /// Quote-currency amount per ladder level, same length as `prices`.
    pub amounts_quote: Vec<Decimal>,
    /// Stop-loss distance as a fraction of the breakeven price.
    pub stop_loss_pct: Decimal,
    /// Take-profit distance as a fraction of the breakeven price.
    pub take_profit_pct: Decimal,
    /// Maximum plan lifetime in milliseconds.
    pub time_limit: u64,
    /// Trailing stop parameters.
    pub trailing_stop: TrailingStop,
    /// Optional per-level activation bounds gating when deeper levels go
    /// live; `None` means every level is live immediately.
    pub activation_bounds: Option<Vec<Decimal>>,
}

impl DcaExecutorConfig {
    /// Validates the ladder invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when `prices` and
    /// `amounts_quote` differ in length or are empty, and
    /// [`LMError::DegenerateAllocation`] when the amounts sum to zero.
    pub fn validate(&self) -> LMResult<()> {
        if self.prices.is_empty() || self.prices.len() != self.amounts_quote.len() {
            return Err(LMError::InvalidConfiguration(format!(
                "ladder must have matching non-empty prices and amounts, got {} prices and {} amounts",
                self.prices.len(),
                self.amounts_quote.len()
            )));
        }

        let total: Decimal = self.amounts_quote.iter().copied().sum();
        if total <= Decimal::ZERO {
            return Err(LMError::DegenerateAllocation(
                "ladder amounts sum to zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the total quote amount across all ladder levels.
    #[must_use]
    pub fn total_amount_quote(&self) -> Decimal {
        self.amounts_quote.iter().copied().sum()
    }
}

/// Configuration for a single-entry position executor.
///
/// Only the configuration contract is modeled here; the triple-barrier state
/// machine lives in the executor runtime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PositionExecutorConfig {
    /// Unique executor identifier.
    pub id: String,
    /// Creation timestamp in milliseconds.
    pub timestamp: u64,
    /// Exchange the position trades on.
    pub exchange: String,
    /// Trading pair.
    pub trading_pair: String,
    /// Position side.
    pub side: Side,
    /// Leverage applied on perpetual markets.
    pub leverage: u32,
    /// Entry price.
    pub entry_price: Decimal,
    /// Quote-currency amount.
    pub amount_quote: Decimal,
    /// Stop-loss distance as a fraction of entry.
    pub stop_loss_pct: Decimal,
    /// Take-profit distance as a fraction of entry.
    pub take_profit_pct: Decimal,
    /// Maximum position lifetime in milliseconds.
    pub time_limit: u64,
    /// Optional trailing stop.
    pub trailing_stop: Option<TrailingStop>,
}

/// Configuration for a two-leg arbitrage executor.
///
/// Only the configuration contract is modeled here; leg matching lives in
/// the executor runtime.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ArbitrageExecutorConfig {
    /// Unique executor identifier.
    pub id: String,
    /// Creation timestamp in milliseconds.
    pub timestamp: u64,
    /// Exchange of the buying leg.
    pub exchange: String,
    /// Trading pair, shared by both legs.
    pub trading_pair: String,
    /// Side of the primary leg.
    pub side: Side,
    /// Leverage applied on perpetual markets.
    pub leverage: u32,
    /// Exchange of the selling leg.
    pub counter_exchange: String,
    /// Quote-currency amount per leg.
    pub amount_quote: Decimal,
    /// Minimum spread required to fire, as a fraction of the buy price.
    pub min_profitability_pct: Decimal,
}

/// Fully parameterized executor plan, one variant per executor kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutorConfig {
    /// Single-entry position plan.
    Position(PositionExecutorConfig),
    /// Multi-level DCA plan.
    Dca(DcaExecutorConfig),
    /// Two-leg arbitrage plan.
    Arbitrage(ArbitrageExecutorConfig),
}

impl ExecutorConfig {
    /// Returns the executor identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Position(config) => &config.id,
            Self::Dca(config) => &config.id,
            Self::Arbitrage(config) => &config.id,
        }
    }

    /// Returns the creation timestamp in milliseconds.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::Position(config) => config.timestamp,
            Self::Dca(config) => config.timestamp,
            Self::Arbitrage(config) => config.timestamp,
        }
    }

    /// Returns the exchange.
    #[must_use]
    pub fn exchange(&self) -> &str {
        match self {
            Self::Position(config) => &config.exchange,
            Self::Dca(config) => &config.exchange,
            Self::Arbitrage(config) => &config.exchange,
        }
    }

    /// Returns the trading pair.
    #[must_use]
    pub fn trading_pair(&self) -> &str {
        match self {
            Self::Position(config) => &config.trading_pair,
            Self::Dca(config) => &config.trading_pair,
            Self::Arbitrage(config) => &config.trading_pair,
        }
    }

    /// Returns the plan side.
    #[must_use]
    pub fn side(&self) -> Side {
        match self {
            Self::Position(config) => config.side,
            Self::Dca(config) => config.side,
            Self::Arbitrage(config) => config.side,
        }
    }

    /// Returns the leverage.
    #[must_use]
    pub fn leverage(&self) -> u32 {
        match self {
            Self::Position(config) => config.leverage,
            Self::Dca(config) => config.leverage,
            Self::Arbitrage(config) => config.leverage,
        }
    }

    /// Returns the executor kind for this configuration.
    #[must_use]
    pub fn executor_type(&self) -> ExecutorType {
        match self {
            Self::Position(_) => ExecutorType::Position,
            Self::Dca(_) => ExecutorType::Dca,
            Self::Arbitrage(_) => ExecutorType::Arbitrage,
        }
    }
}

/// Executor kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutorType {
    /// Single-entry position executor.
    Position,
    /// Multi-level DCA executor.
    Dca,
    /// Two-leg arbitrage executor.
    Arbitrage,
}

impl std::fmt::Display for ExecutorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Position => write!(f, "position"),
            Self::Dca => write!(f, "dca"),
            Self::Arbitrage => write!(f, "arbitrage"),
        }
    }
}

/// Lifecycle state of an executor.
///
/// `Created → Active → Trading → Terminated` with `Terminated` a sink;
/// `Stored` tags a terminated executor once persistence took ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RunStatus {
    /// Instantiated, not yet started.
    Created,
    /// Started, no order placed or filled yet.
    Active,
    /// At least one order live or filled.
    Trading,
    /// Reached a terminal state (barriers hit, early stop, or controller
    /// directed stop).
    Terminated,
    /// Terminated and handed to the persistence collaborator.
    Stored,
}

impl RunStatus {
    /// Returns true while the executor has not terminated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Created | Self::Active | Self::Trading)
    }

    /// Returns true once at least one order is live or filled.
    #[must_use]
    pub fn is_trading(&self) -> bool {
        matches!(self, Self::Trading)
    }

    /// Returns true once the executor reached a terminal state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Terminated | Self::Stored)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Active => write!(f, "active"),
            Self::Trading => write!(f, "trading"),
            Self::Terminated => write!(f, "terminated"),
            Self::Stored => write!(f, "stored"),
        }
    }
}

/// Read-only runtime projection of one executor.
///
/// Exactly one `ExecutorInfo` exists per live or recently closed executor;
/// it is derived from the executor, never constructed independently.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExecutorInfo {
    /// Executor identifier.
    pub id: String,
    /// Executor kind.
    pub executor_type: ExecutorType,
    /// Plan side.
    pub side: Side,
    /// Trading pair.
    pub trading_pair: String,
    /// Exchange.
    pub exchange: String,
    /// The immutable configuration the executor was created from.
    pub config: ExecutorConfig,
    /// Current lifecycle state.
    pub status: RunStatus,
    /// Creation timestamp in milliseconds.
    pub timestamp: u64,
    /// Termination timestamp in milliseconds, set once terminated.
    pub close_timestamp: Option<u64>,
}

impl ExecutorInfo {
    /// Derives a fresh projection from a configuration.
    #[must_use]
    pub fn from_config(config: ExecutorConfig) -> Self {
        Self {
            id: config.id().to_string(),
            executor_type: config.executor_type(),
            side: config.side(),
            trading_pair: config.trading_pair().to_string(),
            exchange: config.exchange().to_string(),
            timestamp: config.timestamp(),
            config,
            status: RunStatus::Created,
            close_timestamp: None,
        }
    }

    /// Returns true while the executor has not terminated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns true once at least one order is live or filled.
    #[must_use]
    pub fn is_trading(&self) -> bool {
        self.status.is_trading()
    }

    /// Returns true once the executor reached a terminal state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    /// Returns the executor age in milliseconds.
    #[must_use]
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.timestamp)
    }
}

/// One-shot command produced by a reconciliation tick.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ExecutorAction {
    /// Instantiate and start a new executor from the configuration.
    Create(Box<ExecutorConfig>),
    /// Request cooperative early stop of the referenced executor.
    Stop(String),
    /// Hand the referenced terminated executor to persistence and evict it.
    Store(String),
}

impl ExecutorAction {
    /// Returns the id of the executor the action refers to.
    #[must_use]
    pub fn executor_id(&self) -> &str {
        match self {
            Self::Create(config) => config.id(),
            Self::Stop(id) | Self::Store(id) => id,
        }
    }
}

/// Generates a unique executor identifier.
pub(crate) fn generate_executor_id(trading_pair: &str, side: Side, timestamp: u64) -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let count = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}-{}", trading_pair, side, timestamp, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dec;

    fn dca_config() -> DcaExecutorConfig {
        DcaExecutorConfig {
            id: "BTC-USDT-Buy-1000-0".to_string(),
            timestamp: 1000,
            exchange: "binance_perpetual".to_string(),
            trading_pair: "BTC-USDT".to_string(),
            side: Side::Buy,
            leverage: 10,
            prices: vec![dec!(100), dec!(95), dec!(90)],
            amounts_quote: vec![dec!(500), dec!(300), dec!(200)],
            stop_loss_pct: dec!(0.03),
            take_profit_pct: dec!(0.02),
            time_limit: 3_600_000,
            trailing_stop: TrailingStop::new(dec!(0.05), dec!(0.005)),
            activation_bounds: None,
        }
    }

    #[test]
    fn test_dca_config_validate_ok() {
        assert!(dca_config().validate().is_ok());
        assert_eq!(dca_config().total_amount_quote(), dec!(1000));
    }

    #[test]
    fn test_dca_config_validate_length_mismatch() {
        let mut config = dca_config();
        config.amounts_quote.pop();
        assert!(matches!(
            config.validate(),
            Err(LMError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_dca_config_validate_zero_allocation() {
        let mut config = dca_config();
        config.amounts_quote = vec![dec!(0), dec!(0), dec!(0)];
        assert!(matches!(
            config.validate(),
            Err(LMError::DegenerateAllocation(_))
        ));
    }

    #[test]
    fn test_config_accessors() {
        let config = ExecutorConfig::Dca(dca_config());
        assert_eq!(config.id(), "BTC-USDT-Buy-1000-0");
        assert_eq!(config.trading_pair(), "BTC-USDT");
        assert_eq!(config.side(), Side::Buy);
        assert_eq!(config.leverage(), 10);
        assert_eq!(config.executor_type(), ExecutorType::Dca);
    }

    #[test]
    fn test_run_status_predicates() {
        assert!(RunStatus::Created.is_active());
        assert!(RunStatus::Active.is_active());
        assert!(RunStatus::Trading.is_active());
        assert!(RunStatus::Trading.is_trading());
        assert!(!RunStatus::Active.is_trading());
        assert!(RunStatus::Terminated.is_closed());
        assert!(RunStatus::Stored.is_closed());
        assert!(!RunStatus::Terminated.is_active());
    }

    #[test]
    fn test_info_from_config() {
        let info = ExecutorInfo::from_config(ExecutorConfig::Dca(dca_config()));
        assert_eq!(info.id, "BTC-USDT-Buy-1000-0");
        assert_eq!(info.status, RunStatus::Created);
        assert_eq!(info.executor_type, ExecutorType::Dca);
        assert!(info.is_active());
        assert!(!info.is_closed());
        assert_eq!(info.age_ms(2500), 1500);
        assert_eq!(info.age_ms(500), 0);
    }

    #[test]
    fn test_action_executor_id() {
        let create = ExecutorAction::Create(Box::new(ExecutorConfig::Dca(dca_config())));
        assert_eq!(create.executor_id(), "BTC-USDT-Buy-1000-0");
        assert_eq!(ExecutorAction::Stop("x".to_string()).executor_id(), "x");
        assert_eq!(ExecutorAction::Store("y".to_string()).executor_id(), "y");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = generate_executor_id("BTC-USDT", Side::Buy, 1000);
        let b = generate_executor_id("BTC-USDT", Side::Buy, 1000);
        assert_ne!(a, b);
    }
}
