use std::fmt;

use opsblade_types::{Credentials, Document, MessageKind, TaskResult};
use opsblade_util::text_processing::redact_sensitive;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;

use super::TaskError;
use crate::document::into_data_map;

/// Lower-cased marker reported by cloud APIs when a dry-run request would have succeeded.
const DRY_RUN_SUCCESS_MARKER: &str = "request would have succeeded";

/// Per-invocation record handed to a task constructor.
///
/// Built by the orchestrator immediately before dispatch and owned by the task
/// for the rest of its life.
#[derive(Debug, Clone, Default)]
pub struct TaskContext {
    /// Environment selector; an instruction-level `env` overrides the run's.
    pub env: String,
    pub dry_run: bool,
    pub debug: bool,
    pub name: String,
    /// Registered task type.
    pub task: String,
    /// One-based position of the instruction in the run.
    pub sequence: usize,
    /// The full instruction record serialized as JSON.
    pub instructions: Vec<u8>,
    /// Appended to failure messages when set.
    pub error_message: String,
    /// Run-level credentials.
    pub credentials: Credentials,
}

impl TaskContext {
    /// Human label such as `Task 3 "stop web" (aws_ec2_stop)`.
    pub fn label(&self) -> String {
        format!("Task {} \"{}\" ({})", self.sequence, self.name, self.task)
    }

    /// Builds a result for this invocation.
    ///
    /// `data` is coerced into a string-keyed map: maps are kept, lists are keyed
    /// by index, scalars are stored under `"0"`, and null yields no data.
    pub fn result(&self, success: bool, msg: impl Into<String>, data: Document) -> TaskResult {
        TaskResult {
            message_type: MessageKind::TaskStop,
            success,
            msg: msg.into(),
            sequence: self.sequence,
            name: self.name.clone(),
            task: self.task.clone(),
            data: into_data_map(data),
            no_vars: false,
        }
    }

    /// Builds a failed result, formatting the message as `msg: cause` and
    /// appending the instruction's custom error message when one is set.
    pub fn error(&self, msg: &str, cause: Option<&dyn fmt::Display>) -> TaskResult {
        let mut message = match cause {
            Some(cause) => format!("{msg}: {cause}"),
            None => msg.to_string(),
        };
        if !self.error_message.is_empty() {
            message = format!("{message}\n\n{}\n", self.error_message);
        }
        self.result(false, message, Document::Null)
    }

    /// Converts a task error into a result.
    ///
    /// Under dry-run, an error reporting that the request would have succeeded
    /// is a success.
    pub fn fail(&self, error: TaskError) -> TaskResult {
        let message = error.to_string();
        if self.dry_run && message.to_lowercase().contains(DRY_RUN_SUCCESS_MARKER) {
            debug!(sequence = self.sequence, task = %self.task, "dry-run request reported as successful");
            return self.result(true, format!("Dry run, API returned: {message}"), Document::Null);
        }
        self.error(&message, None)
    }

    /// Decodes the instruction payload into the task's own field struct.
    pub fn decode_instructions<T: DeserializeOwned>(&self) -> Result<T, TaskError> {
        Ok(serde_json::from_slice(&self.instructions)?)
    }

    /// Debug record of a task's fields after variable expansion, as compact JSON.
    ///
    /// Returns `None` outside debug mode. Secret-looking values are redacted.
    pub fn task_dump<T: Serialize>(&self, instructions: &T) -> Option<String> {
        if !self.debug {
            return None;
        }
        let mut fields = serde_json::to_value(instructions)
            .unwrap_or_else(|error| Document::String(format!("error serializing task: {error}")));
        redact_strings(&mut fields);
        let record = json!({
            "message_type": MessageKind::TaskDump,
            "sequence": self.sequence,
            "task": self.task,
            "task_dump": fields,
        });
        Some(record.to_string())
    }

    /// Resolves the credentials a task should use, preferring its own block.
    pub fn resolve_credentials(&self, task_local: &Credentials) -> Credentials {
        Credentials::resolve(task_local, &self.credentials)
    }
}

fn redact_strings(value: &mut Document) {
    match value {
        Document::String(text) => *text = redact_sensitive(text),
        Document::Array(items) => items.iter_mut().for_each(redact_strings),
        Document::Object(map) => map.values_mut().for_each(redact_strings),
        _ => {}
    }
}
