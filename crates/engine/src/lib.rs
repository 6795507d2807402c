//! # OpsBlade Engine
//!
//! The OpsBlade engine runs declarative operations workflows: an ordered list of
//! instruction records, each dispatched to a registered task, executed strictly
//! in sequence with fail-fast semantics.
//!
//! ## Key Features
//!
//! - **Selection**: Criteria-based filtering over untyped documents with case-insensitive paths and wildcards
//! - **Projection**: Extraction of caller-named fields, including per-element flattening of lists
//! - **Variables**: A run-scoped variable table fed by every task's result data
//! - **Templating**: `{{name}}` substitution over typed instruction fields
//! - **Orchestration**: Start/stop notifications to a pluggable observer that may halt the run
//!
//! ## Usage
//!
//! ```rust
//! use opsblade_engine::{Workflow, RunObserver};
//! use opsblade_types::{TaskInfo, TaskResult};
//!
//! struct Quiet;
//!
//! impl RunObserver for Quiet {
//!     fn on_start(&mut self, _info: &TaskInfo) -> bool { true }
//!     fn on_stop(&mut self, result: &TaskResult) -> bool { result.success }
//! }
//!
//! let mut workflow = Workflow::new().with_observer(Quiet);
//! workflow.load_str(r#"
//! tasks:
//!   - task: variables_set
//!     set:
//!       - name: app
//!         value: billing
//!   - task: variables_dump
//!     fields: [app]
//! "#)?;
//!
//! assert!(workflow.execute());
//! assert_eq!(workflow.variables().get_string("app"), "billing");
//! # Ok::<(), opsblade_engine::WorkflowError>(())
//! ```
//!
//! ## Architecture
//!
//! The engine is organized into several key modules:
//!
//! - **`document`**: Normalization of typed values into the untyped [`Document`](opsblade_types::Document) tree
//! - **`select`**: Selection criteria evaluation
//! - **`fields`**: Field projection and spec de-confliction
//! - **`variables`**: The run-scoped [`VariableStore`]
//! - **`templates`**: Marker substitution and the [`Rewrite`] trait
//! - **`task`**: The [`Task`] contract, [`TaskContext`], errors, and the [`TaskRegistry`]
//! - **`tasks`**: Built-in local tasks
//! - **`workflow`**: Loading and the sequential orchestrator

pub mod document;
pub mod fields;
pub mod select;
pub mod task;
pub mod tasks;
pub mod templates;
pub mod variables;
pub mod workflow;

// Re-export commonly used types for convenience
pub use document::{NormalizeError, normalize};
pub use fields::{deconflict_fields, project, project_document};
pub use select::{CompareOperator, SelectError, select, select_document};
pub use task::{Task, TaskConstructor, TaskContext, TaskError, TaskRegistry, poll_until};
pub use templates::{MAX_SUBSTITUTIONS, Rewrite, TemplateError, Templater};
pub use variables::VariableStore;
pub use workflow::{ConsoleObserver, RunObserver, Workflow, WorkflowError};
