//! DCA ladder builder: turns discovered price clusters into a fully
//! parameterized executor configuration.
//!
//! The ladder starts at the reference price and scales in at the discovered
//! clusters on the adverse side (supports for a Buy, resistances for a Sell).
//! Capital is split across the ladder by the configured normalized weights,
//! the stop loss is anchored one range-fraction beyond the deepest level, and
//! the trailing stop arms at the nearest opposite-side cluster.
//!
//! # Example
//!
//! ```rust
//! use level_maker_rs::levels::{LevelDiscovery, PriceCluster};
//! use level_maker_rs::strategy::{LevelControllerConfig, build_dca_config};
//! use level_maker_rs::types::Side;
//! use level_maker_rs::dec;
//!
//! let config = LevelControllerConfig::new("binance_perpetual", "BTC-USDT", dec!(1000))
//!     .unwrap()
//!     .with_levels(2, vec![dec!(0.5), dec!(0.3), dec!(0.2)])
//!     .unwrap();
//!
//! let discovery = LevelDiscovery {
//!     high_clusters: vec![PriceCluster { centroid: dec!(108), member_count: 2 }],
//!     low_clusters: vec![
//!         PriceCluster { centroid: dec!(90), member_count: 1 },
//!         PriceCluster { centroid: dec!(95), member_count: 3 },
//!     ],
//! };
//!
//! let plan = build_dca_config(Side::Buy, dec!(100), &discovery, dec!(100), &config, 1000)
//!     .unwrap();
//!
//! assert_eq!(plan.prices, vec![dec!(100), dec!(95), dec!(90)]);
//! assert_eq!(plan.amounts_quote, vec![dec!(500), dec!(300), dec!(200)]);
//! ```

use crate::Decimal;
use crate::execution::{DcaExecutorConfig, TrailingStop, generate_executor_id};
use crate::levels::LevelDiscovery;
use crate::types::Side;
use crate::types::error::{LMError, LMResult};

use super::config::LevelControllerConfig;

/// Builds a DCA executor configuration from discovered clusters.
///
/// # Arguments
///
/// * `side` - Plan side
/// * `reference_price` - Current reference (entry) price
/// * `discovery` - Cluster sets from the discovery engine
/// * `price_range` - Full `max(high) - min(low)` range of the bar window
/// * `config` - Controller configuration
/// * `now` - Timestamp in milliseconds stamped on the plan
///
/// # Errors
///
/// - [`LMError::InsufficientLevels`] when no cluster exists on either side of
///   the reference price; the caller skips creation this tick.
/// - [`LMError::DegenerateAllocation`] when the truncated weight prefix
///   allocates zero quote.
/// - [`LMError::InvalidConfiguration`] when the reference price is not
///   positive.
///
/// When only the same-side cluster set is empty, the plan degrades to an
/// entry-only ladder and the stop loss falls back to the configured fixed
/// fraction; when only the opposite-side set is empty, the trailing-stop
/// activation falls back to the configured fixed fraction. Both fallbacks are
/// deterministic functions of the inputs.
pub fn build_dca_config(
    side: Side,
    reference_price: Decimal,
    discovery: &LevelDiscovery,
    price_range: Decimal,
    config: &LevelControllerConfig,
    now: u64,
) -> LMResult<DcaExecutorConfig> {
    if reference_price <= Decimal::ZERO {
        return Err(LMError::InvalidConfiguration(
            "reference_price must be positive".to_string(),
        ));
    }

    let selected = select_scale_in_clusters(side, reference_price, discovery);
    let opposite = nearest_opposite_cluster(side, reference_price, discovery);

    if selected.is_empty() && opposite.is_none() {
        return Err(LMError::InsufficientLevels(format!(
            "no clusters around reference price {reference_price}"
        )));
    }

    // The plan never allocates more capital slices than it has price levels
    // (entry included), and never more levels than it has weights.
    let weights = &config.dca_amounts_pct;
    let levels = weights.len().min(selected.len() + 1);

    let mut prices = Vec::with_capacity(levels);
    prices.push(reference_price);
    prices.extend(selected.iter().take(levels - 1).copied());

    let amounts_quote: Vec<Decimal> = weights
        .iter()
        .take(levels)
        .map(|w| *w * config.total_amount_quote)
        .collect();

    let total: Decimal = amounts_quote.iter().copied().sum();
    if total <= Decimal::ZERO {
        return Err(LMError::DegenerateAllocation(format!(
            "truncated weights allocate zero quote across {levels} levels"
        )));
    }

    let breakeven = prices
        .iter()
        .zip(&amounts_quote)
        .map(|(p, a)| *p * *a)
        .sum::<Decimal>()
        / total;

    // Stop loss one range-fraction beyond the deepest ladder level, expressed
    // against breakeven because breakeven shifts as deeper levels fill.
    let stop_loss_pct = if selected.is_empty() {
        config.stop_loss
    } else {
        let worst = prices[prices.len() - 1];
        match side {
            Side::Buy => {
                let sl_price = worst - price_range * config.stop_loss;
                (breakeven - sl_price) / breakeven
            }
            Side::Sell => {
                let sl_price = worst + price_range * config.stop_loss;
                (sl_price - breakeven) / breakeven
            }
        }
    };

    let activation_pct = match opposite {
        Some(anchor) => match side {
            Side::Buy => (anchor - reference_price) / reference_price,
            Side::Sell => (reference_price - anchor) / reference_price,
        },
        None => config.trailing_stop.activation_pct,
    };

    let plan = DcaExecutorConfig {
        id: generate_executor_id(&config.trading_pair, side, now),
        timestamp: now,
        exchange: config.exchange.clone(),
        trading_pair: config.trading_pair.clone(),
        side,
        leverage: config.leverage,
        prices,
        amounts_quote,
        stop_loss_pct,
        take_profit_pct: config.take_profit,
        time_limit: config.time_limit,
        trailing_stop: TrailingStop::new(activation_pct, config.trailing_stop.trailing_delta_pct),
        activation_bounds: config.activation_bounds.clone(),
    };
    plan.validate()?;

    Ok(plan)
}

/// Clusters the plan scales into, ordered away from the reference price in
/// the direction of adverse movement.
fn select_scale_in_clusters(
    side: Side,
    reference_price: Decimal,
    discovery: &LevelDiscovery,
) -> Vec<Decimal> {
    let mut selected: Vec<Decimal> = match side {
        Side::Buy => discovery
            .low_clusters
            .iter()
            .map(|c| c.centroid)
            .filter(|c| *c < reference_price)
            .collect(),
        Side::Sell => discovery
            .high_clusters
            .iter()
            .map(|c| c.centroid)
            .filter(|c| *c > reference_price)
            .collect(),
    };

    match side {
        Side::Buy => selected.sort_by(|a, b| b.cmp(a)),
        Side::Sell => selected.sort(),
    }
    selected
}

/// Nearest cluster on the profit side: resistance above for a Buy, support
/// below for a Sell.
fn nearest_opposite_cluster(
    side: Side,
    reference_price: Decimal,
    discovery: &LevelDiscovery,
) -> Option<Decimal> {
    match side {
        Side::Buy => discovery
            .high_clusters
            .iter()
            .map(|c| c.centroid)
            .filter(|c| *c > reference_price)
            .min(),
        Side::Sell => discovery
            .low_clusters
            .iter()
            .map(|c| c.centroid)
            .filter(|c| *c < reference_price)
            .max(),
    }
}
