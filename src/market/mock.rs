//! Mock market data provider and connector for testing.

use std::collections::HashSet;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::Decimal;
use crate::types::error::{LMError, LMResult};
use crate::types::{CandleSeries, PositionMode, PriceKind};

use super::provider::{ExchangeConnector, MarketDataProvider};

/// In-memory market data provider with scriptable candles, price, readiness
/// and failure mode.
#[derive(Debug)]
pub struct MockMarketDataProvider {
    ready: AtomicBool,
    fail: AtomicBool,
    series: RwLock<CandleSeries>,
    price: RwLock<Decimal>,
    pairs: RwLock<HashSet<String>>,
}

impl MockMarketDataProvider {
    /// Creates a provider serving the given candles and price.
    #[must_use]
    pub fn new(series: CandleSeries, price: Decimal) -> Self {
        Self {
            ready: AtomicBool::new(true),
            fail: AtomicBool::new(false),
            series: RwLock::new(series),
            price: RwLock::new(price),
            pairs: RwLock::new(HashSet::new()),
        }
    }

    /// Sets the readiness flag.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Makes every subsequent fetch fail, simulating an upstream outage.
    pub fn fail_requests(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Replaces the served candles.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn set_candles(&self, series: CandleSeries) {
        *self.series.write().unwrap() = series;
    }

    /// Replaces the served price.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn set_price(&self, price: Decimal) {
        *self.price.write().unwrap() = price;
    }

    /// Replaces the served trading pairs.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    pub fn set_trading_pairs(&self, pairs: HashSet<String>) {
        *self.pairs.write().unwrap() = pairs;
    }

    fn check_available(&self) -> LMResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LMError::MarketDataUnavailable(
                "mock provider configured to fail".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketDataProvider {
    fn ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn candles(
        &self,
        _exchange: &str,
        _trading_pair: &str,
        _interval: &str,
        max_records: usize,
    ) -> LMResult<CandleSeries> {
        self.check_available()?;
        let series = self.series.read().unwrap();
        Ok(CandleSeries::from_candles(
            max_records,
            series.candles().to_vec(),
        ))
    }

    async fn price(
        &self,
        _exchange: &str,
        _trading_pair: &str,
        _kind: PriceKind,
    ) -> LMResult<Decimal> {
        self.check_available()?;
        Ok(*self.price.read().unwrap())
    }

    async fn trading_pairs(&self, _exchange: &str) -> LMResult<HashSet<String>> {
        self.check_available()?;
        Ok(self.pairs.read().unwrap().clone())
    }
}

/// Mock connector counting bootstrap calls.
#[derive(Debug, Default)]
pub struct MockConnector {
    leverage_calls: AtomicUsize,
    position_mode_calls: AtomicUsize,
    last_leverage: AtomicU32,
}

impl MockConnector {
    /// Creates a new mock connector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set_leverage` calls observed.
    #[must_use]
    pub fn leverage_calls(&self) -> usize {
        self.leverage_calls.load(Ordering::SeqCst)
    }

    /// Number of `set_position_mode` calls observed.
    #[must_use]
    pub fn position_mode_calls(&self) -> usize {
        self.position_mode_calls.load(Ordering::SeqCst)
    }

    /// Last leverage value set.
    #[must_use]
    pub fn last_leverage(&self) -> u32 {
        self.last_leverage.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeConnector for MockConnector {
    async fn set_leverage(&self, _trading_pair: &str, leverage: u32) -> LMResult<()> {
        self.leverage_calls.fetch_add(1, Ordering::SeqCst);
        self.last_leverage.store(leverage, Ordering::SeqCst);
        Ok(())
    }

    async fn set_position_mode(&self, _mode: PositionMode) -> LMResult<()> {
        self.position_mode_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
