//! Price-level discovery engine.
//!
//! This module turns a window of OHLC bars into a small set of representative
//! support/resistance levels:
//!
//! 1. A prominence threshold is derived from the window's full high/low range.
//! 2. Local maxima of the highs and local minima of the lows are detected,
//!    subject to that prominence and a minimum spacing between peaks.
//! 3. Each peak-price set is partitioned with Ward-linkage hierarchical
//!    clustering; the per-cluster mean is the level.
//!
//! The engine is a pure function of its inputs: identical bars and parameters
//! always produce identical clusters.
//!
//! # Example
//!
//! ```rust
//! use level_maker_rs::levels::discover;
//! use level_maker_rs::types::{Candle, CandleSeries};
//! use level_maker_rs::{Decimal, dec};
//!
//! let highs = [100u32, 110, 100, 115, 100, 108, 100, 120, 100, 112, 100];
//! let mut series = CandleSeries::new(64);
//! for (i, h) in highs.iter().enumerate() {
//!     let high = Decimal::from(*h);
//!     series.push(Candle::new(dec!(95), high, dec!(90), high, i as u64 * 1000));
//! }
//!
//! let discovery = discover(&series, dec!(0.02), 2, 3).unwrap();
//! assert_eq!(discovery.high_clusters.len(), 3);
//! ```

mod cluster;
mod peaks;

pub use cluster::ward_clusters;
pub use peaks::{find_peaks, find_troughs};

use crate::Decimal;
use crate::types::CandleSeries;
use crate::types::error::{LMError, LMResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Floor applied to the prominence threshold so a flat window (zero price
/// range) cannot register every sample as a peak.
const MIN_PROMINENCE: Decimal = Decimal::from_parts(1, 0, 0, false, 9); // 1e-9

/// One discovered price level: the mean of a cluster of peak prices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PriceCluster {
    /// Mean price of the cluster members.
    pub centroid: Decimal,
    /// Number of peaks assigned to the cluster.
    pub member_count: usize,
}

/// Result of one discovery pass: resistance and support clusters, each
/// sorted ascending by centroid.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LevelDiscovery {
    /// Clusters of high-price peaks (resistance levels).
    pub high_clusters: Vec<PriceCluster>,
    /// Clusters of low-price troughs (support levels).
    pub low_clusters: Vec<PriceCluster>,
}

impl LevelDiscovery {
    /// Returns true when neither side produced a cluster.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.high_clusters.is_empty() && self.low_clusters.is_empty()
    }
}

/// Returns the absolute prominence threshold for a bar window.
///
/// The threshold is the window's `max(high) - min(low)` range scaled by
/// `prominence_fraction`, floored at a small positive minimum.
#[must_use]
pub fn prominence_threshold(series: &CandleSeries, prominence_fraction: Decimal) -> Decimal {
    (series.price_range() * prominence_fraction).max(MIN_PROMINENCE)
}

/// Discovers support/resistance clusters from a window of bars.
///
/// # Arguments
///
/// * `series` - Bar window snapshot, ascending by time
/// * `prominence_fraction` - Peak prominence as a fraction of the price range
/// * `min_spacing` - Minimum bars between accepted peaks
/// * `k` - Number of clusters requested per side
///
/// # Errors
///
/// Returns [`LMError::InvalidConfiguration`] if `prominence_fraction` is not
/// positive or `k` is zero.
///
/// Fewer detected peaks than `k` shrink the corresponding output below `k`
/// (down to empty); callers must handle a short result.
pub fn discover(
    series: &CandleSeries,
    prominence_fraction: Decimal,
    min_spacing: usize,
    k: usize,
) -> LMResult<LevelDiscovery> {
    if prominence_fraction <= Decimal::ZERO {
        return Err(LMError::InvalidConfiguration(
            "prominence_fraction must be positive".to_string(),
        ));
    }
    if k == 0 {
        return Err(LMError::InvalidConfiguration(
            "cluster count must be greater than 0".to_string(),
        ));
    }

    let prominence = prominence_threshold(series, prominence_fraction);
    let highs = series.highs();
    let lows = series.lows();

    let high_peaks = find_peaks(&highs, prominence, min_spacing);
    let low_troughs = find_troughs(&lows, prominence, min_spacing);

    let high_prices: Vec<Decimal> = high_peaks.iter().map(|&i| highs[i]).collect();
    let low_prices: Vec<Decimal> = low_troughs.iter().map(|&i| lows[i]).collect();

    Ok(LevelDiscovery {
        high_clusters: ward_clusters(&high_prices, k),
        low_clusters: ward_clusters(&low_prices, k),
    })
}
