//! Error types for the level maker library.
//!
//! All fallible operations return [`LMResult`], with [`LMError`] covering the
//! full taxonomy: configuration rejected at load time, per-tick recoverable
//! decision failures, dropped actions, and collaborator failures.

use thiserror::Error;

/// Error type for all level maker operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LMError {
    /// Configuration is invalid and was rejected at load time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No usable price clusters were discovered for a decision.
    ///
    /// Recoverable: skip creating that executor this tick and retry next tick.
    #[error("insufficient price levels: {0}")]
    InsufficientLevels(String),

    /// The capital allocation for a ladder sums to zero.
    ///
    /// Recoverable: skip creating that executor this tick and retry next tick.
    #[error("degenerate allocation: {0}")]
    DegenerateAllocation(String),

    /// An action referenced an executor in a state that cannot accept it.
    ///
    /// The single action is dropped; the tick continues.
    #[error("invalid action target: {0}")]
    InvalidActionTarget(String),

    /// Upstream market data is unavailable.
    ///
    /// The decision phase is skipped for the tick; no actions are emitted.
    #[error("market data unavailable: {0}")]
    MarketDataUnavailable(String),

    /// An executor runtime failed to start or report.
    #[error("executor runtime error: {0}")]
    ExecutorRuntime(String),

    /// The persistence collaborator failed.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Result type alias for level maker operations.
pub type LMResult<T> = Result<T, LMError>;
