//! Shared type definitions for OpsBlade.
//!
//! Everything here is plain data: the untyped [`Document`] tree, selection
//! criteria, credentials, run notifications, and the workflow document itself.
//! Behavior lives in `opsblade-engine`.

pub mod criteria;
pub mod credentials;
pub mod notification;
pub mod workflow;

pub use criteria::{Filter, SelectionCriteria};
pub use credentials::{Credentials, ServiceCredentials};
pub use notification::{MessageKind, TaskInfo, TaskResult};
pub use workflow::WorkflowDocument;

/// Canonical untyped value: null, bool, number, string, list, or string-keyed map.
pub type Document = serde_json::Value;

/// String-keyed map of documents, the shape of task data and instruction records.
pub type DataMap = serde_json::Map<String, Document>;
