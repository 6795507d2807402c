use serde::{Deserialize, Serialize};

use crate::Document;

/// A single `(path, operator, operand)` test applied to a document.
///
/// `field` is a dot-separated path that may contain a `*` segment, `compare`
/// names one of the selection operators (case-insensitive), and `value` is the
/// operand the resolved leaf is compared against.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SelectionCriteria {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub compare: String,
    #[serde(default)]
    pub value: Document,
}

impl SelectionCriteria {
    pub fn new(field: impl Into<String>, compare: impl Into<String>, value: impl Into<Document>) -> Self {
        Self {
            field: field.into(),
            compare: compare.into(),
            value: value.into(),
        }
    }
}

/// Server-side filter passed through to an external API.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Filter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}
