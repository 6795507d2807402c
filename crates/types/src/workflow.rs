//! Top-level workflow document as authored in YAML.

use serde::Deserialize;

use crate::{Credentials, DataMap};

/// A workflow file: run-level settings plus the ordered instruction records.
///
/// Instruction records stay untyped; each task decodes its own fields from the
/// record once the orchestrator dispatches it.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WorkflowDocument {
    /// Environment selector handed to every task unless an instruction overrides it.
    #[serde(default)]
    pub env: String,
    /// Simulate side effects instead of performing them.
    #[serde(default)]
    pub dryrun: bool,
    /// Include raw instructions in start notifications.
    #[serde(default)]
    pub debug: bool,
    /// Emit notifications as JSON instead of the human form.
    #[serde(default)]
    pub json: bool,
    /// Run-level credentials, overridden per service by an instruction's own block.
    #[serde(default)]
    pub credentials: Credentials,
    /// Ordered instruction records.
    #[serde(default)]
    pub tasks: Vec<DataMap>,
}

impl WorkflowDocument {
    /// Parses a workflow from YAML text. JSON is accepted as well since it is a YAML subset.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}
