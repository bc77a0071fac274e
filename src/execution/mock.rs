//! Mock executor runtime for testing.
//!
//! [`MockExecutor`] implements [`ExecutorRuntime`] with scriptable state
//! transitions: tests drive `mark_trading`/`terminate` through a
//! [`MockExecutorHandle`] while the orchestrator interacts with the runtime
//! through the trait, exactly as it would with a real worker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::types::error::{LMError, LMResult};

use super::executor::{ExecutorConfig, ExecutorInfo, RunStatus};
use super::runtime::{ExecutorFactory, ExecutorRuntime};

#[derive(Debug)]
struct Shared {
    info: RwLock<ExecutorInfo>,
    clock: AtomicU64,
    start_calls: AtomicUsize,
    early_stop_calls: AtomicUsize,
}

/// Test handle that drives a mock executor's state from the outside.
#[derive(Debug, Clone)]
pub struct MockExecutorHandle {
    shared: Arc<Shared>,
}

impl MockExecutorHandle {
    /// Advances the executor's internal clock, used as the termination
    /// timestamp on early stop.
    pub fn advance_clock(&self, now: u64) {
        self.shared.clock.store(now, Ordering::SeqCst);
    }

    /// Marks the executor as trading (first order live or filled).
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    pub fn mark_trading(&self) {
        let mut info = self.shared.info.write().unwrap();
        if info.status.is_active() {
            info.status = RunStatus::Trading;
        }
    }

    /// Terminates the executor on its own schedule at `close_timestamp`.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    pub fn terminate(&self, close_timestamp: u64) {
        let mut info = self.shared.info.write().unwrap();
        if info.status.is_active() {
            info.status = RunStatus::Terminated;
            info.close_timestamp = Some(close_timestamp);
        }
    }

    /// Returns the current lifecycle state.
    ///
    /// # Panics
    ///
    /// Panics if the state lock is poisoned.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.shared.info.read().unwrap().status
    }

    /// Number of `start` calls observed.
    #[must_use]
    pub fn start_calls(&self) -> usize {
        self.shared.start_calls.load(Ordering::SeqCst)
    }

    /// Number of `early_stop` calls observed.
    #[must_use]
    pub fn early_stop_calls(&self) -> usize {
        self.shared.early_stop_calls.load(Ordering::SeqCst)
    }
}

/// Scriptable in-memory executor runtime.
#[derive(Debug)]
pub struct MockExecutor {
    shared: Arc<Shared>,
}

impl MockExecutor {
    /// Creates a mock executor in the `Created` state.
    #[must_use]
    pub fn new(config: ExecutorConfig) -> Self {
        let timestamp = config.timestamp();
        Self {
            shared: Arc::new(Shared {
                info: RwLock::new(ExecutorInfo::from_config(config)),
                clock: AtomicU64::new(timestamp),
                start_calls: AtomicUsize::new(0),
                early_stop_calls: AtomicUsize::new(0),
            }),
        }
    }

    /// Returns a handle for driving this executor from tests.
    #[must_use]
    pub fn handle(&self) -> MockExecutorHandle {
        MockExecutorHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[async_trait]
impl ExecutorRuntime for MockExecutor {
    async fn start(&mut self) -> LMResult<()> {
        self.shared.start_calls.fetch_add(1, Ordering::SeqCst);
        let mut info = self.shared.info.write().unwrap();
        if info.status != RunStatus::Created {
            return Err(LMError::ExecutorRuntime(format!(
                "executor {} started twice",
                info.id
            )));
        }
        info.status = RunStatus::Active;
        Ok(())
    }

    fn early_stop(&self) {
        self.shared.early_stop_calls.fetch_add(1, Ordering::SeqCst);
        let mut info = self.shared.info.write().unwrap();
        // Idempotent: stopping an already-terminated executor is a no-op.
        if info.status.is_active() {
            info.status = RunStatus::Terminated;
            info.close_timestamp = Some(self.shared.clock.load(Ordering::SeqCst));
        }
    }

    fn info(&self) -> ExecutorInfo {
        self.shared.info.read().unwrap().clone()
    }
}

/// Factory producing [`MockExecutor`]s and retaining their handles.
#[derive(Debug, Default)]
pub struct MockExecutorFactory {
    handles: Arc<RwLock<HashMap<String, MockExecutorHandle>>>,
    fail_creation: AtomicBool,
}

impl MockExecutorFactory {
    /// Creates a new factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create` call fail, for error-path tests.
    pub fn fail_creation(&self, fail: bool) {
        self.fail_creation.store(fail, Ordering::SeqCst);
    }

    /// Returns the handle of a previously created executor.
    ///
    /// # Panics
    ///
    /// Panics if the handle lock is poisoned.
    #[must_use]
    pub fn handle(&self, executor_id: &str) -> Option<MockExecutorHandle> {
        self.handles.read().unwrap().get(executor_id).cloned()
    }

    /// Number of executors created so far.
    ///
    /// # Panics
    ///
    /// Panics if the handle lock is poisoned.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.handles.read().unwrap().len()
    }
}

impl ExecutorFactory for MockExecutorFactory {
    fn create(&self, config: ExecutorConfig) -> LMResult<Box<dyn ExecutorRuntime>> {
        if self.fail_creation.load(Ordering::SeqCst) {
            return Err(LMError::ExecutorRuntime(
                "mock factory configured to fail".to_string(),
            ));
        }

        let executor = MockExecutor::new(config);
        self.handles
            .write()
            .unwrap()
            .insert(executor.info().id.clone(), executor.handle());
        Ok(Box::new(executor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dec;
    use crate::execution::executor::{DcaExecutorConfig, TrailingStop};
    use crate::types::Side;

    fn config(id: &str) -> ExecutorConfig {
        ExecutorConfig::Dca(DcaExecutorConfig {
            id: id.to_string(),
            timestamp: 1000,
            exchange: "binance_perpetual".to_string(),
            trading_pair: "BTC-USDT".to_string(),
            side: Side::Buy,
            leverage: 10,
            prices: vec![dec!(100)],
            amounts_quote: vec![dec!(1000)],
            stop_loss_pct: dec!(0.03),
            take_profit_pct: dec!(0.02),
            time_limit: 1000,
            trailing_stop: TrailingStop::new(dec!(0.05), dec!(0.005)),
            activation_bounds: None,
        })
    }

    #[tokio::test]
    async fn test_lifecycle_transitions() {
        let mut executor = MockExecutor::new(config("a"));
        let handle = executor.handle();

        assert_eq!(handle.status(), RunStatus::Created);
        executor.start().await.unwrap();
        assert_eq!(handle.status(), RunStatus::Active);

        handle.mark_trading();
        assert_eq!(handle.status(), RunStatus::Trading);

        handle.terminate(5000);
        assert_eq!(handle.status(), RunStatus::Terminated);
        assert_eq!(executor.info().close_timestamp, Some(5000));
    }

    #[tokio::test]
    async fn test_double_start_is_an_error() {
        let mut executor = MockExecutor::new(config("a"));
        executor.start().await.unwrap();
        assert!(executor.start().await.is_err());
    }

    #[tokio::test]
    async fn test_early_stop_is_idempotent() {
        let mut executor = MockExecutor::new(config("a"));
        let handle = executor.handle();
        executor.start().await.unwrap();

        handle.advance_clock(4000);
        executor.early_stop();
        assert_eq!(handle.status(), RunStatus::Terminated);
        assert_eq!(executor.info().close_timestamp, Some(4000));

        // A second stop must not disturb the terminal state.
        handle.advance_clock(9000);
        executor.early_stop();
        assert_eq!(executor.info().close_timestamp, Some(4000));
        assert_eq!(handle.early_stop_calls(), 2);
    }

    #[tokio::test]
    async fn test_early_stop_after_self_termination() {
        let mut executor = MockExecutor::new(config("a"));
        let handle = executor.handle();
        executor.start().await.unwrap();

        handle.terminate(3000);
        executor.early_stop();

        assert_eq!(handle.status(), RunStatus::Terminated);
        assert_eq!(executor.info().close_timestamp, Some(3000));
    }

    #[test]
    fn test_factory_retains_handles() {
        let factory = MockExecutorFactory::new();
        let executor = factory.create(config("a")).unwrap();

        assert_eq!(factory.created_count(), 1);
        let handle = factory.handle("a").unwrap();
        assert_eq!(handle.status(), RunStatus::Created);
        assert_eq!(executor.info().id, "a");
        assert!(factory.handle("missing").is_none());
    }

    #[test]
    fn test_factory_failure_mode() {
        let factory = MockExecutorFactory::new();
        factory.fail_creation(true);
        assert!(factory.create(config("a")).is_err());
        assert_eq!(factory.created_count(), 0);
    }
}
