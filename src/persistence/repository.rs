//! Repository trait for closed-executor persistence.

use async_trait::async_trait;

use crate::execution::ExecutorInfo;
use crate::types::error::LMResult;

/// Abstract repository for terminated executors.
///
/// The orchestrator hands an executor here exactly once, after confirming it
/// terminated; ownership of the record transfers to the repository.
/// Implementations can use different backends (in-memory, SQL, etc.).
#[async_trait]
pub trait ExecutorRepository: Send + Sync {
    /// Stores a terminated executor's final snapshot.
    async fn store_executor(&self, info: &ExecutorInfo) -> LMResult<()>;

    /// Gets a stored executor by id.
    async fn executor(&self, id: &str) -> LMResult<Option<ExecutorInfo>>;

    /// Gets stored executors for a trading pair.
    async fn executors_by_pair(&self, trading_pair: &str) -> LMResult<Vec<ExecutorInfo>>;

    /// Returns the total number of stored executors.
    async fn executor_count(&self) -> LMResult<usize>;

    /// Clears all stored data (for testing).
    async fn clear_all(&self) -> LMResult<()>;
}
