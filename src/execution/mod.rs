//! Execution module: executor plans, actions and lifecycle orchestration.
//!
//! This module defines:
//!
//! - **Plan types**: [`ExecutorConfig`] and its variants, [`TrailingStop`]
//! - **Runtime projection**: [`ExecutorInfo`], [`RunStatus`]
//! - **Actions**: [`ExecutorAction`] consumed by the apply phase
//! - **Seams**: [`ExecutorRuntime`], [`ExecutorFactory`], [`DecisionEngine`]
//! - **Orchestration**: [`ExecutorOrchestrator`] driving the per-tick
//!   snapshot → decide → apply cycle
//! - **Mocks**: [`MockExecutor`], [`MockExecutorFactory`] for testing
//!
//! # Example
//!
//! ```rust,ignore
//! use level_maker_rs::execution::{ExecutorOrchestrator, OrchestratorConfig};
//!
//! let mut orchestrator = ExecutorOrchestrator::new(
//!     OrchestratorConfig::new("BTC-USDT"),
//!     Box::new(controller),
//!     Box::new(factory),
//!     repository,
//!     connector,
//! );
//! orchestrator.tick(now).await?;
//! ```

/// Executor configuration, info and action types.
pub mod executor;

/// Mock executor runtime for testing.
pub mod mock;

/// Lifecycle orchestrator.
pub mod orchestrator;

/// Traits at the orchestrator's seams.
pub mod runtime;

pub use executor::{
    ArbitrageExecutorConfig, DcaExecutorConfig, ExecutorAction, ExecutorConfig, ExecutorInfo,
    ExecutorType, PositionExecutorConfig, RunStatus, TrailingStop,
};
pub(crate) use executor::generate_executor_id;
pub use mock::{MockExecutor, MockExecutorFactory, MockExecutorHandle};
pub use orchestrator::{ExecutorOrchestrator, OrchestratorConfig, OrchestratorStats};
pub use runtime::{DecisionEngine, ExecutionReport, ExecutorFactory, ExecutorRuntime};
