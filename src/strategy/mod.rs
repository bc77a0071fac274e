//! Strategy layer: configuration, ladder building and the level controller.
//!
//! This module turns discovered price levels into executor plans and
//! lifecycle decisions:
//!
//! - [`LevelControllerConfig`] — validated strategy parameters with a
//!   hot-reloadable subset
//! - [`build_dca_config`] — the DCA ladder builder
//! - [`LevelController`] — the per-tick decision engine injected into the
//!   orchestrator
//! - [`Distributions`] — capital-allocation weight generators

/// Controller configuration and weight distributions.
pub mod config;

/// Per-tick decision engine.
pub mod controller;

/// DCA ladder builder.
pub mod ladder;

pub use config::{
    ControllerConfigUpdate, Distributions, LevelControllerConfig, normalize_weights,
    parse_activation_bounds,
};
pub use controller::LevelController;
pub use ladder::build_dca_config;
