//! Static configuration for the level controller.
//!
//! A [`LevelControllerConfig`] is created once at strategy start and validated
//! at load time: malformed activation-bounds literals or non-positive numeric
//! fields are rejected before anything runs. A subset of fields can later be
//! hot-reloaded through [`ControllerConfigUpdate`]; the clustering window and
//! the number of DCA levels are fixed for the strategy's life.
//!
//! # Example
//!
//! ```rust
//! use level_maker_rs::strategy::{Distributions, LevelControllerConfig};
//! use level_maker_rs::dec;
//!
//! let config = LevelControllerConfig::new("binance_perpetual", "BTC-USDT", dec!(1000))
//!     .unwrap()
//!     .with_clustering(500, dec!(0.02), 5)
//!     .unwrap()
//!     .with_levels(3, Distributions::geometric(3, dec!(1), dec!(2)))
//!     .unwrap()
//!     .with_activation_bounds_literal("0.01,0.02")
//!     .unwrap();
//!
//! // Weights are normalized to sum 1 at load time.
//! let sum: level_maker_rs::Decimal = config.dca_amounts_pct.iter().copied().sum();
//! assert_eq!(sum, dec!(1));
//! ```

use crate::Decimal;
use crate::execution::TrailingStop;
use crate::types::PositionMode;
use crate::types::error::{LMError, LMResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Capital-allocation weight generators for DCA ladders.
///
/// The generated sequences are raw weights; the controller configuration
/// normalizes them to sum 1 at load time.
pub struct Distributions;

impl Distributions {
    /// `n` equal weights.
    #[must_use]
    pub fn equal(n: usize) -> Vec<Decimal> {
        vec![Decimal::ONE; n]
    }

    /// `n` weights growing geometrically: `start * ratio^i`.
    #[must_use]
    pub fn geometric(n: usize, start: Decimal, ratio: Decimal) -> Vec<Decimal> {
        let mut weights = Vec::with_capacity(n);
        let mut current = start;
        for _ in 0..n {
            weights.push(current);
            current *= ratio;
        }
        weights
    }

    /// `n` weights growing arithmetically: `start + i * step`.
    #[must_use]
    pub fn arithmetic(n: usize, start: Decimal, step: Decimal) -> Vec<Decimal> {
        (0..n)
            .map(|i| start + Decimal::from(i as u64) * step)
            .collect()
    }
}

/// Static strategy parameters for the level controller.
///
/// Construct with [`LevelControllerConfig::new`] and refine with the `with_*`
/// builders; every builder validates its inputs so an invalid configuration
/// never leaves the load phase.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LevelControllerConfig {
    /// Exchange the strategy trades on.
    pub exchange: String,
    /// Trading pair the strategy trades.
    pub trading_pair: String,
    /// Candle interval used for discovery (e.g. "3m").
    pub interval: String,
    /// Total quote-currency budget per executor.
    pub total_amount_quote: Decimal,
    /// Leverage applied on perpetual markets.
    pub leverage: u32,
    /// Position mode applied on perpetual markets.
    pub position_mode: PositionMode,
    /// Bars in the clustering window. Not hot-reloadable.
    pub cluster_window: usize,
    /// Peak prominence as a fraction of the window's price range.
    pub cluster_prominence: Decimal,
    /// Minimum bars between accepted peaks.
    pub cluster_spacing: usize,
    /// Number of DCA scale-in levels. Not hot-reloadable.
    pub dca_levels: usize,
    /// Normalized capital-allocation weights, entry slice first; sums to 1.
    pub dca_amounts_pct: Vec<Decimal>,
    /// Optional per-level activation bounds; `None` disables gating.
    pub activation_bounds: Option<Vec<Decimal>>,
    /// Stop-loss fraction of the window's price range past the worst level.
    pub stop_loss: Decimal,
    /// Take-profit fraction.
    pub take_profit: Decimal,
    /// Executor time limit in milliseconds.
    pub time_limit: u64,
    /// Trailing stop parameters; the activation value doubles as the
    /// fallback when no opposite-side cluster exists.
    pub trailing_stop: TrailingStop,
    /// Age after which a never-filled executor is refreshed, milliseconds.
    pub order_refresh_time: u64,
    /// Pause after a termination before the slot is re-created, milliseconds.
    pub cooldown_time: u64,
    /// Newest terminated executors kept in memory; older ones are stored.
    pub retention_buffer: usize,
}

impl LevelControllerConfig {
    /// Creates a configuration with defaults for everything but identity.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when `exchange` or
    /// `trading_pair` is empty or `total_amount_quote` is not positive.
    pub fn new(
        exchange: impl Into<String>,
        trading_pair: impl Into<String>,
        total_amount_quote: Decimal,
    ) -> LMResult<Self> {
        let exchange = exchange.into();
        let trading_pair = trading_pair.into();

        if exchange.is_empty() || trading_pair.is_empty() {
            return Err(LMError::InvalidConfiguration(
                "exchange and trading_pair must not be empty".to_string(),
            ));
        }
        if total_amount_quote <= Decimal::ZERO {
            return Err(LMError::InvalidConfiguration(
                "total_amount_quote must be positive".to_string(),
            ));
        }

        Ok(Self {
            exchange,
            trading_pair,
            interval: "3m".to_string(),
            total_amount_quote,
            leverage: 10,
            position_mode: PositionMode::default(),
            cluster_window: 1500,
            cluster_prominence: Decimal::new(2, 2), // 0.02
            cluster_spacing: 5,
            dca_levels: 4,
            dca_amounts_pct: normalize_weights(&Distributions::geometric(
                4,
                Decimal::new(1, 2),
                Decimal::TWO,
            ))?,
            activation_bounds: None,
            stop_loss: Decimal::new(3, 2),   // 0.03
            take_profit: Decimal::new(2, 2), // 0.02
            time_limit: 2_700_000,
            trailing_stop: TrailingStop::new(Decimal::new(5, 2), Decimal::new(5, 3)),
            order_refresh_time: 60_000,
            cooldown_time: 60_000,
            retention_buffer: 5,
        })
    }

    /// Sets the candle interval.
    #[must_use]
    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = interval.into();
        self
    }

    /// Sets the clustering window, prominence fraction and peak spacing.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when the window is zero, the
    /// prominence fraction is not positive, or the spacing is zero.
    pub fn with_clustering(
        mut self,
        cluster_window: usize,
        cluster_prominence: Decimal,
        cluster_spacing: usize,
    ) -> LMResult<Self> {
        if cluster_window == 0 {
            return Err(LMError::InvalidConfiguration(
                "cluster_window must be greater than 0".to_string(),
            ));
        }
        if cluster_prominence <= Decimal::ZERO {
            return Err(LMError::InvalidConfiguration(
                "cluster_prominence must be positive".to_string(),
            ));
        }
        if cluster_spacing == 0 {
            return Err(LMError::InvalidConfiguration(
                "cluster_spacing must be greater than 0".to_string(),
            ));
        }

        self.cluster_window = cluster_window;
        self.cluster_prominence = cluster_prominence;
        self.cluster_spacing = cluster_spacing;
        Ok(self)
    }

    /// Sets the number of DCA levels and the capital-allocation weights.
    ///
    /// Weights are normalized to sum 1.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when `dca_levels` is zero or
    /// the weights are empty, negative, or sum to zero.
    pub fn with_levels(mut self, dca_levels: usize, weights: Vec<Decimal>) -> LMResult<Self> {
        if dca_levels == 0 {
            return Err(LMError::InvalidConfiguration(
                "dca_levels must be greater than 0".to_string(),
            ));
        }

        self.dca_levels = dca_levels;
        self.dca_amounts_pct = normalize_weights(&weights)?;
        Ok(self)
    }

    /// Sets the activation bounds from an explicit list.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when any bound is negative.
    pub fn with_activation_bounds(mut self, bounds: Option<Vec<Decimal>>) -> LMResult<Self> {
        if let Some(values) = &bounds
            && values.iter().any(|b| *b < Decimal::ZERO)
        {
            return Err(LMError::InvalidConfiguration(
                "activation bounds must not be negative".to_string(),
            ));
        }

        self.activation_bounds = bounds;
        Ok(self)
    }

    /// Sets the activation bounds from a comma-separated literal.
    ///
    /// An empty literal disables gating (all levels live immediately).
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when the literal does not
    /// parse as comma-separated decimals.
    pub fn with_activation_bounds_literal(self, literal: &str) -> LMResult<Self> {
        self.with_activation_bounds(parse_activation_bounds(literal)?)
    }

    /// Sets stop-loss, take-profit and time-limit risk parameters.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when a fraction is not
    /// positive or the time limit is zero.
    pub fn with_risk(
        mut self,
        stop_loss: Decimal,
        take_profit: Decimal,
        time_limit: u64,
    ) -> LMResult<Self> {
        if stop_loss <= Decimal::ZERO || take_profit <= Decimal::ZERO {
            return Err(LMError::InvalidConfiguration(
                "stop_loss and take_profit must be positive".to_string(),
            ));
        }
        if time_limit == 0 {
            return Err(LMError::InvalidConfiguration(
                "time_limit must be greater than 0".to_string(),
            ));
        }

        self.stop_loss = stop_loss;
        self.take_profit = take_profit;
        self.time_limit = time_limit;
        Ok(self)
    }

    /// Sets the trailing stop parameters.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when either fraction is not
    /// positive.
    pub fn with_trailing_stop(mut self, trailing_stop: TrailingStop) -> LMResult<Self> {
        if trailing_stop.activation_pct <= Decimal::ZERO
            || trailing_stop.trailing_delta_pct <= Decimal::ZERO
        {
            return Err(LMError::InvalidConfiguration(
                "trailing stop fractions must be positive".to_string(),
            ));
        }

        self.trailing_stop = trailing_stop;
        Ok(self)
    }

    /// Sets refresh, cooldown and retention scheduling parameters.
    ///
    /// A zero cooldown disables the pause between termination and re-creation.
    #[must_use]
    pub fn with_scheduling(
        mut self,
        order_refresh_time: u64,
        cooldown_time: u64,
        retention_buffer: usize,
    ) -> Self {
        self.order_refresh_time = order_refresh_time;
        self.cooldown_time = cooldown_time;
        self.retention_buffer = retention_buffer;
        self
    }

    /// Sets the leverage.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when leverage is zero.
    pub fn with_leverage(mut self, leverage: u32) -> LMResult<Self> {
        if leverage == 0 {
            return Err(LMError::InvalidConfiguration(
                "leverage must be greater than 0".to_string(),
            ));
        }

        self.leverage = leverage;
        Ok(self)
    }

    /// Sets the position mode.
    #[must_use]
    pub fn with_position_mode(mut self, position_mode: PositionMode) -> Self {
        self.position_mode = position_mode;
        self
    }

    /// Number of clusters requested per side: one per DCA level plus the
    /// immediate entry.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.dca_levels + 1
    }

    /// Returns true for leveraged/perpetual markets.
    #[must_use]
    pub fn is_perpetual(&self) -> bool {
        self.exchange.contains("perpetual")
    }

    /// Applies a partial update to the hot-reloadable subset.
    ///
    /// The clustering window and the number of DCA levels are not
    /// reloadable and are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`LMError::InvalidConfiguration`] when any updated value fails
    /// the same validation as at load time; the configuration is unchanged in
    /// that case.
    pub fn hot_reload(&mut self, update: ControllerConfigUpdate) -> LMResult<()> {
        let mut next = self.clone();

        if let Some(prominence) = update.cluster_prominence {
            let (cluster_window, cluster_spacing) = (next.cluster_window, next.cluster_spacing);
            next = next.with_clustering(cluster_window, prominence, cluster_spacing)?;
        }
        if let Some(spacing) = update.cluster_spacing {
            let (cluster_window, cluster_prominence) =
                (next.cluster_window, next.cluster_prominence);
            next = next.with_clustering(cluster_window, cluster_prominence, spacing)?;
        }
        if let Some(weights) = update.dca_amounts_distribution {
            let dca_levels = next.dca_levels;
            next = next.with_levels(dca_levels, weights)?;
        }
        if let Some(bounds) = update.activation_bounds {
            next = next.with_activation_bounds(bounds)?;
        }
        if let Some(stop_loss) = update.stop_loss {
            let (take_profit, time_limit) = (next.take_profit, next.time_limit);
            next = next.with_risk(stop_loss, take_profit, time_limit)?;
        }
        if let Some(take_profit) = update.take_profit {
            let (stop_loss, time_limit) = (next.stop_loss, next.time_limit);
            next = next.with_risk(stop_loss, take_profit, time_limit)?;
        }
        if let Some(time_limit) = update.time_limit {
            let (stop_loss, take_profit) = (next.stop_loss, next.take_profit);
            next = next.with_risk(stop_loss, take_profit, time_limit)?;
        }
        if let Some(trailing_stop) = update.trailing_stop {
            next = next.with_trailing_stop(trailing_stop)?;
        }
        if let Some(refresh) = update.order_refresh_time {
            next.order_refresh_time = refresh;
        }
        if let Some(cooldown) = update.cooldown_time {
            next.cooldown_time = cooldown;
        }
        if let Some(retention) = update.retention_buffer {
            next.retention_buffer = retention;
        }

        *self = next;
        Ok(())
    }
}

/// Partial update applied through [`LevelControllerConfig::hot_reload`].
///
/// Every field is optional; `None` leaves the current value in place.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerConfigUpdate {
    /// New prominence fraction.
    pub cluster_prominence: Option<Decimal>,
    /// New peak spacing.
    pub cluster_spacing: Option<usize>,
    /// New raw weight sequence (normalized on apply).
    pub dca_amounts_distribution: Option<Vec<Decimal>>,
    /// New activation bounds (`Some(None)` clears gating).
    pub activation_bounds: Option<Option<Vec<Decimal>>>,
    /// New stop-loss fraction.
    pub stop_loss: Option<Decimal>,
    /// New take-profit fraction.
    pub take_profit: Option<Decimal>,
    /// New time limit in milliseconds.
    pub time_limit: Option<u64>,
    /// New trailing stop parameters.
    pub trailing_stop: Option<TrailingStop>,
    /// New refresh age in milliseconds.
    pub order_refresh_time: Option<u64>,
    /// New cooldown in milliseconds.
    pub cooldown_time: Option<u64>,
    /// New retention buffer size.
    pub retention_buffer: Option<usize>,
}

/// Normalizes raw weights so they sum to 1.
///
/// # Errors
///
/// Returns [`LMError::InvalidConfiguration`] when the sequence is empty,
/// contains a negative entry, or sums to zero.
pub fn normalize_weights(weights: &[Decimal]) -> LMResult<Vec<Decimal>> {
    if weights.is_empty() {
        return Err(LMError::InvalidConfiguration(
            "weight sequence must not be empty".to_string(),
        ));
    }
    if weights.iter().any(|w| *w < Decimal::ZERO) {
        return Err(LMError::InvalidConfiguration(
            "weights must not be negative".to_string(),
        ));
    }

    let total: Decimal = weights.iter().copied().sum();
    if total <= Decimal::ZERO {
        return Err(LMError::InvalidConfiguration(
            "weights must sum to a positive value".to_string(),
        ));
    }

    Ok(weights.iter().map(|w| w / total).collect())
}

/// Parses activation bounds from a comma-separated literal.
///
/// An empty (or all-whitespace) literal means "no gating" and yields `None`.
///
/// # Errors
///
/// Returns [`LMError::InvalidConfiguration`] when an entry does not parse as
/// a decimal.
pub fn parse_activation_bounds(literal: &str) -> LMResult<Option<Vec<Decimal>>> {
    let trimmed = literal.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .split(',')
        .map(|entry| {
            entry.trim().parse::<Decimal>().map_err(|_| {
                LMError::InvalidConfiguration(format!(
                    "malformed activation bound literal: {entry:?}"
                ))
            })
        })
        .collect::<LMResult<Vec<Decimal>>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dec;

    fn config() -> LevelControllerConfig {
        LevelControllerConfig::new("binance_perpetual", "BTC-USDT", dec!(1000)).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_identity() {
        assert!(LevelControllerConfig::new("", "BTC-USDT", dec!(1000)).is_err());
        assert!(LevelControllerConfig::new("binance", "", dec!(1000)).is_err());
        assert!(LevelControllerConfig::new("binance", "BTC-USDT", dec!(0)).is_err());
    }

    #[test]
    fn test_default_weights_normalized() {
        let sum: Decimal = config().dca_amounts_pct.iter().copied().sum();
        assert_eq!(sum, dec!(1));
    }

    #[test]
    fn test_normalize_weights() {
        let normalized = normalize_weights(&[dec!(1), dec!(1), dec!(2)]).unwrap();
        assert_eq!(normalized, vec![dec!(0.25), dec!(0.25), dec!(0.5)]);

        let sum: Decimal = normalize_weights(&[dec!(0.3), dec!(0.3), dec!(0.1)])
            .unwrap()
            .iter()
            .copied()
            .sum();
        assert!((sum - dec!(1)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_normalize_weights_rejects_degenerate() {
        assert!(normalize_weights(&[]).is_err());
        assert!(normalize_weights(&[dec!(0), dec!(0)]).is_err());
        assert!(normalize_weights(&[dec!(1), dec!(-1)]).is_err());
    }

    #[test]
    fn test_parse_activation_bounds() {
        assert_eq!(parse_activation_bounds("").unwrap(), None);
        assert_eq!(parse_activation_bounds("   ").unwrap(), None);
        assert_eq!(
            parse_activation_bounds("0.01,0.02").unwrap(),
            Some(vec![dec!(0.01), dec!(0.02)])
        );
        assert_eq!(
            parse_activation_bounds(" 0.01 , 0.02 ").unwrap(),
            Some(vec![dec!(0.01), dec!(0.02)])
        );
        assert!(parse_activation_bounds("0.01,abc").is_err());
    }

    #[test]
    fn test_with_clustering_validation() {
        assert!(config().with_clustering(0, dec!(0.02), 5).is_err());
        assert!(config().with_clustering(100, dec!(0), 5).is_err());
        assert!(config().with_clustering(100, dec!(0.02), 0).is_err());

        let updated = config().with_clustering(300, dec!(0.05), 3).unwrap();
        assert_eq!(updated.cluster_window, 300);
        assert_eq!(updated.cluster_prominence, dec!(0.05));
    }

    #[test]
    fn test_with_risk_validation() {
        assert!(config().with_risk(dec!(0), dec!(0.02), 1000).is_err());
        assert!(config().with_risk(dec!(0.03), dec!(0.02), 0).is_err());
    }

    #[test]
    fn test_cluster_count() {
        let updated = config().with_levels(3, Distributions::equal(4)).unwrap();
        assert_eq!(updated.cluster_count(), 4);
    }

    #[test]
    fn test_is_perpetual() {
        assert!(config().is_perpetual());
        let spot = LevelControllerConfig::new("binance", "BTC-USDT", dec!(1000)).unwrap();
        assert!(!spot.is_perpetual());
    }

    #[test]
    fn test_distributions() {
        assert_eq!(Distributions::equal(3), vec![dec!(1), dec!(1), dec!(1)]);
        assert_eq!(
            Distributions::geometric(4, dec!(1), dec!(2)),
            vec![dec!(1), dec!(2), dec!(4), dec!(8)]
        );
        assert_eq!(
            Distributions::arithmetic(3, dec!(1), dec!(0.5)),
            vec![dec!(1), dec!(1.5), dec!(2)]
        );
    }

    #[test]
    fn test_hot_reload_touches_reloadable_fields_only() {
        let mut config = config();
        let window_before = config.cluster_window;
        let levels_before = config.dca_levels;

        config
            .hot_reload(ControllerConfigUpdate {
                cluster_prominence: Some(dec!(0.05)),
                stop_loss: Some(dec!(0.1)),
                retention_buffer: Some(2),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.cluster_prominence, dec!(0.05));
        assert_eq!(config.stop_loss, dec!(0.1));
        assert_eq!(config.retention_buffer, 2);
        assert_eq!(config.cluster_window, window_before);
        assert_eq!(config.dca_levels, levels_before);
    }

    #[test]
    fn test_hot_reload_rejects_invalid_and_keeps_state() {
        let mut config = config();
        let before = config.clone();

        let result = config.hot_reload(ControllerConfigUpdate {
            cluster_prominence: Some(dec!(-1)),
            ..Default::default()
        });

        assert!(result.is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn test_hot_reload_clears_activation_bounds() {
        let mut config = config()
            .with_activation_bounds_literal("0.01,0.02")
            .unwrap();

        config
            .hot_reload(ControllerConfigUpdate {
                activation_bounds: Some(None),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.activation_bounds, None);
    }
}
