//! Start and stop notifications emitted for every instruction of a run.
//!
//! Both records serialize to compact or pretty JSON for machine consumers and
//! implement `Display` for the human console form.

use std::fmt;

use opsblade_util::text_processing::{redact_sensitive, render_yaml_block};
use serde::{Deserialize, Serialize};

use crate::{DataMap, Document};

/// Tag carried in the `message_type` field of a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    TaskStart,
    #[default]
    TaskStop,
    TaskSkipped,
    /// Debug record of a task's resolved fields.
    TaskDump,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::TaskStart => "task_start",
            MessageKind::TaskStop => "task_stop",
            MessageKind::TaskSkipped => "task_skipped",
            MessageKind::TaskDump => "task_dump",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single instruction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskResult {
    pub message_type: MessageKind,
    pub success: bool,
    /// Free-form message, usually the error text on failure.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg: String,
    pub sequence: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub task: String,
    /// Data merged into the variable store after the task finishes.
    #[serde(default, skip_serializing_if = "DataMap::is_empty")]
    pub data: DataMap,
    /// When set, `data` is reported but not merged into the variable store.
    #[serde(skip)]
    pub no_vars: bool,
}

impl TaskResult {
    /// Compact JSON form.
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| self.serialization_failure(&error))
    }

    /// Indented JSON form.
    pub fn serialize_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|error| self.serialization_failure(&error))
    }

    fn serialization_failure(&self, error: &serde_json::Error) -> String {
        serde_json::json!({
            "message_type": self.message_type,
            "success": false,
            "msg": format!("error serializing task result: {error}"),
            "sequence": self.sequence,
            "name": self.name,
            "task": self.task,
        })
        .to_string()
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            writeln!(f, "* Completed task {}: [{}]", self.sequence, self.task)?;
        } else {
            writeln!(f, "* Completed task {}: \"{}\" [{}]", self.sequence, self.name, self.task)?;
        }
        writeln!(f, "Success: {}", self.success)?;
        writeln!(f, "Message: {}", self.msg.trim_end_matches('\n'))?;
        if self.data.is_empty() {
            write!(f, "Data: none")
        } else {
            let data = Document::Object(self.data.clone());
            write!(f, "Data:\n{}", render_yaml_block(&data, "  "))
        }
    }
}

/// Announcement sent before an instruction's task is constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskInfo {
    pub message_type: MessageKind,
    pub sequence: usize,
    pub name: String,
    pub task: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub msg: String,
    /// The raw instruction record, without its credentials block.
    pub instructions: DataMap,
    pub debug: bool,
}

impl TaskInfo {
    /// Compact JSON form.
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|error| self.serialization_failure(&error))
    }

    /// Indented JSON form.
    pub fn serialize_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|error| self.serialization_failure(&error))
    }

    fn serialization_failure(&self, error: &serde_json::Error) -> String {
        serde_json::json!({
            "message_type": self.message_type,
            "sequence": self.sequence,
            "name": self.name,
            "task": self.task,
            "msg": format!("error serializing task info: {error}"),
            "instructions": null,
            "debug": self.debug,
        })
        .to_string()
    }
}

impl fmt::Display for TaskInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "* Starting task {}: [{}]", self.sequence, self.task)?;
        } else {
            write!(f, "* Starting task {}: \"{}\" [{}]", self.sequence, self.name, self.task)?;
        }
        if !self.debug {
            return Ok(());
        }
        if self.instructions.is_empty() {
            write!(f, "\nInstructions: none")
        } else {
            let instructions = Document::Object(self.instructions.clone());
            let rendered = redact_sensitive(&render_yaml_block(&instructions, "  "));
            write!(f, "\nInstructions:\n{rendered}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Document) -> DataMap {
        match value {
            Document::Object(map) => map,
            _ => DataMap::new(),
        }
    }

    #[test]
    fn result_serializes_with_snake_case_kind_and_omits_empty_fields() {
        let result = TaskResult {
            message_type: MessageKind::TaskSkipped,
            success: true,
            msg: "Task skipped".into(),
            sequence: 2,
            task: "sleep".into(),
            no_vars: true,
            ..TaskResult::default()
        };

        let value: Document = serde_json::from_str(&result.serialize()).expect("json");
        assert_eq!(
            value,
            json!({"message_type": "task_skipped", "success": true, "msg": "Task skipped", "sequence": 2, "task": "sleep"})
        );
    }

    #[test]
    fn result_display_lists_data_as_yaml() {
        let result = TaskResult {
            success: true,
            sequence: 1,
            name: "seed".into(),
            task: "variables_set".into(),
            data: data(json!({"region": "us-east-1"})),
            ..TaskResult::default()
        };

        assert_eq!(
            result.to_string(),
            "* Completed task 1: \"seed\" [variables_set]\nSuccess: true\nMessage: \nData:\n  region: us-east-1"
        );
    }

    #[test]
    fn result_display_without_name_or_data() {
        let result = TaskResult {
            sequence: 3,
            task: "exit_if".into(),
            msg: "boom".into(),
            ..TaskResult::default()
        };
        assert_eq!(result.to_string(), "* Completed task 3: [exit_if]\nSuccess: false\nMessage: boom\nData: none");
    }

    #[test]
    fn info_display_shows_redacted_instructions_in_debug() {
        let mut info = TaskInfo {
            message_type: MessageKind::TaskStart,
            sequence: 1,
            name: "notify".into(),
            task: "example".into(),
            instructions: data(json!({"task": "example", "api_token": "abc123"})),
            ..TaskInfo::default()
        };
        assert_eq!(info.to_string(), "* Starting task 1: \"notify\" [example]");

        info.debug = true;
        let rendered = info.to_string();
        assert!(rendered.starts_with("* Starting task 1: \"notify\" [example]\nInstructions:\n"));
        assert!(rendered.contains("  api_token: [REDACTED]"));
        assert!(!rendered.contains("abc123"));
    }

    #[test]
    fn info_pretty_json_round_trips() {
        let info = TaskInfo {
            message_type: MessageKind::TaskStart,
            sequence: 4,
            task: "sleep".into(),
            ..TaskInfo::default()
        };
        let parsed: TaskInfo = serde_json::from_str(&info.serialize_pretty()).expect("json");
        assert_eq!(parsed, info);
    }
}
