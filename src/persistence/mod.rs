//! Persistence layer for closed executors.
//!
//! Once the orchestrator confirms an executor terminated and applies a store
//! action, the executor's final [`ExecutorInfo`](crate::execution::ExecutorInfo)
//! is handed to an [`ExecutorRepository`] and leaves the in-memory registry.
//!
//! # Example
//!
//! ```rust,ignore
//! use level_maker_rs::persistence::{ExecutorRepository, InMemoryRepository};
//!
//! let repo = InMemoryRepository::new();
//! repo.store_executor(&info).await?;
//! let restored = repo.executor(&info.id).await?;
//! ```

mod memory;
mod repository;

pub use memory::InMemoryRepository;
pub use repository::ExecutorRepository;
