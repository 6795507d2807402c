//! Task contract and registry.
//!
//! A task is constructed from a fresh [`TaskContext`] and a borrowed
//! [`VariableStore`](crate::variables::VariableStore), then executed exactly
//! once. Everything a task needs beyond that (its own fields, credentials,
//! dry-run handling) is decoded from the context's instruction payload.

pub mod context;
pub mod error;
pub mod polling;
pub mod registry;

use opsblade_types::TaskResult;

pub use context::TaskContext;
pub use error::TaskError;
pub use polling::poll_until;
pub use registry::{TaskConstructor, TaskRegistry};

/// A unit of work dispatched by the orchestrator.
pub trait Task {
    /// Runs the task to completion and reports its outcome.
    fn execute(&mut self) -> TaskResult;
}
