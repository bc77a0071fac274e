//! # level-maker-rs
//!
//! A Rust library implementing the decision-and-control core of a level-based
//! DCA market-making strategy.
//!
//! The library combines three components, composed leaf-first:
//!
//! - **Price-level discovery** ([`levels`]): prominence-based peak detection
//!   over OHLC history, partitioned into support/resistance clusters with
//!   Ward-linkage hierarchical clustering.
//! - **Plan building** ([`strategy`]): the clusters become a sized,
//!   risk-bounded multi-level DCA order plan — entry ladder, quote
//!   allocation, breakeven-relative stop loss, structure-anchored trailing
//!   stop.
//! - **Lifecycle orchestration** ([`execution`]): a fixed-period
//!   reconciliation tick that snapshots the executor population, asks the
//!   strategy for actions, and applies them exactly once — creating,
//!   refreshing, cooling down, stopping and archiving workers without
//!   double-submission or leaks.
//!
//! Exchange connectivity, executor internals and persistence backends are
//! external collaborators behind traits ([`market`], [`persistence`],
//! [`execution::ExecutorRuntime`]).
//!
//! # Example
//!
//! ```rust
//! use level_maker_rs::dec;
//! use level_maker_rs::levels::{LevelDiscovery, PriceCluster};
//! use level_maker_rs::strategy::{LevelControllerConfig, build_dca_config};
//! use level_maker_rs::types::Side;
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
//! let plan = build_dca_config(Side::Buy, dec!(100), &discovery, dec!(100), &config, 1_000)
//!     .unwrap();
//!
//! assert_eq!(plan.prices, vec![dec!(100), dec!(95), dec!(90)]);
//! assert_eq!(plan.amounts_quote, vec![dec!(500), dec!(300), dec!(200)]);
//! ```

/// Execution module: executor plans, actions and lifecycle orchestration.
pub mod execution;

/// Price-level discovery engine.
pub mod levels;

/// Market data and exchange account interfaces.
pub mod market;

/// Persistence layer for closed executors.
pub mod persistence;

/// Strategy layer: configuration, ladder building, level controller.
pub mod strategy;

/// Common types shared across the library.
pub mod types;

/// Decimal type used for all prices, amounts and fractions.
pub use rust_decimal::Decimal;

/// Decimal literal macro.
pub use rust_decimal_macros::dec;
