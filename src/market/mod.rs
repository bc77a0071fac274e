//! Market data and exchange account interfaces.
//!
//! This module defines the external collaborators the strategy consumes:
//!
//! - **Data**: [`MarketDataProvider`] for candles, prices and pair discovery
//! - **Account**: [`ExchangeConnector`] for one-time leverage/position-mode
//!   bootstrap on perpetual markets
//! - **Mocks**: [`MockMarketDataProvider`], [`MockConnector`] for testing

/// Provider and connector traits.
pub mod provider;

/// Mock implementations for testing.
pub mod mock;

pub use mock::{MockConnector, MockMarketDataProvider};
pub use provider::{ExchangeConnector, MarketDataProvider};
