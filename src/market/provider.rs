//! Market data provider and exchange connector traits.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::Decimal;
use crate::types::error::LMResult;
use crate::types::{CandleSeries, PositionMode, PriceKind};

/// Read-only market data consumed by the decision layer.
///
/// Implementations own candle retrieval and storage; the strategy only ever
/// reads bounded snapshots.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Returns true once the provider has warmed up enough history to serve
    /// decisions.
    fn ready(&self) -> bool;

    /// Returns a snapshot of the newest `max_records` candles.
    async fn candles(
        &self,
        exchange: &str,
        trading_pair: &str,
        interval: &str,
        max_records: usize,
    ) -> LMResult<CandleSeries>;

    /// Returns the requested price for a trading pair.
    async fn price(&self, exchange: &str, trading_pair: &str, kind: PriceKind)
    -> LMResult<Decimal>;

    /// Returns the trading pairs available on an exchange.
    async fn trading_pairs(&self, exchange: &str) -> LMResult<HashSet<String>>;
}

/// Exchange account operations used once at bootstrap.
#[async_trait]
pub trait ExchangeConnector: Send + Sync {
    /// Sets the leverage for a trading pair.
    async fn set_leverage(&self, trading_pair: &str, leverage: u32) -> LMResult<()>;

    /// Sets the account position mode.
    async fn set_position_mode(&self, mode: PositionMode) -> LMResult<()>;
}
