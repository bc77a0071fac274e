//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::execution::ExecutorInfo;
use crate::types::error::LMResult;

use super::repository::ExecutorRepository;

type ExecutorMap = HashMap<String, ExecutorInfo>;

/// In-memory repository implementation for testing.
#[derive(Debug, Clone)]
pub struct InMemoryRepository {
    executors: Arc<RwLock<ExecutorMap>>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            executors: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl ExecutorRepository for InMemoryRepository {
    async fn store_executor(&self, info: &ExecutorInfo) -> LMResult<()> {
        let mut executors = self.executors.write().await;
        executors.insert(info.id.clone(), info.clone());
        Ok(())
    }

    async fn executor(&self, id: &str) -> LMResult<Option<ExecutorInfo>> {
        let executors = self.executors.read().await;
        Ok(executors.get(id).cloned())
    }

    async fn executors_by_pair(&self, trading_pair: &str) -> LMResult<Vec<ExecutorInfo>> {
        let executors = self.executors.read().await;
        let mut result: Vec<ExecutorInfo> = executors
            .values()
            .filter(|info| info.trading_pair == trading_pair)
            .cloned()
            .collect();
        result.sort_by_key(|info| info.close_timestamp);
        Ok(result)
    }

    async fn executor_count(&self) -> LMResult<usize> {
        let executors = self.executors.read().await;
        Ok(executors.len())
    }

    async fn clear_all(&self) -> LMResult<()> {
        let mut executors = self.executors.write().await;
        executors.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dec;
    use crate::execution::{DcaExecutorConfig, ExecutorConfig, RunStatus, TrailingStop};
    use crate::types::Side;

    fn stored_info(id: &str, trading_pair: &str, close_timestamp: u64) -> ExecutorInfo {
        let config = ExecutorConfig::Dca(DcaExecutorConfig {
            id: id.to_string(),
            timestamp: 1000,
            exchange: "binance_perpetual".to_string(),
            trading_pair: trading_pair.to_string(),
            side: Side::Buy,
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
        info.status = RunStatus::Stored;
        info.close_timestamp = Some(close_timestamp);
        info
    }

    #[tokio::test]
    async fn test_store_and_get() {
        let repo = InMemoryRepository::new();
        repo.store_executor(&stored_info("a", "BTC-USDT", 2000))
            .await
            .unwrap();

        let loaded = repo.executor("a").await.unwrap().unwrap();
        assert_eq!(loaded.id, "a");
        assert_eq!(loaded.status, RunStatus::Stored);
        assert!(repo.executor("missing").await.unwrap().is_none());
        assert_eq!(repo.executor_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_executors_by_pair_sorted_by_close_time() {
        let repo = InMemoryRepository::new();
        repo.store_executor(&stored_info("b", "BTC-USDT", 3000))
            .await
            .unwrap();
        repo.store_executor(&stored_info("a", "BTC-USDT", 2000))
            .await
            .unwrap();
        repo.store_executor(&stored_info("c", "ETH-USDT", 1000))
            .await
            .unwrap();

        let btc = repo.executors_by_pair("BTC-USDT").await.unwrap();
        assert_eq!(btc.len(), 2);
        assert_eq!(btc[0].id, "a");
        assert_eq!(btc[1].id, "b");
    }

    #[tokio::test]
    async fn test_clear_all() {
        let repo = InMemoryRepository::new();
        repo.store_executor(&stored_info("a", "BTC-USDT", 2000))
            .await
            .unwrap();
        repo.clear_all().await.unwrap();
        assert_eq!(repo.executor_count().await.unwrap(), 0);
    }
}
