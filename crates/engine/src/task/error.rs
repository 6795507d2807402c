use std::{error::Error as StdError, time::Duration};

use thiserror::Error;

use crate::{select::SelectError, templates::TemplateError};

/// Boxed error returned by an external collaborator.
pub type ExternalError = Box<dyn StdError + Send + Sync + 'static>;

/// Failures a task can report.
///
/// Every variant ends up in a failed [`TaskResult`](opsblade_types::TaskResult)
/// through [`TaskContext::fail`](super::TaskContext::fail); the orchestrator
/// treats them all alike and halts the run.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("failed to deserialize instructions: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Configuration(String),

    #[error("failed applying selection criteria: {0}")]
    Operator(#[from] SelectError),

    #[error("failed to resolve variables: {0}")]
    Template(#[from] TemplateError),

    #[error("{context}: {source}")]
    ExternalCall {
        context: String,
        #[source]
        source: ExternalError,
    },

    #[error("timed out after {}s waiting for {what}", .waited.as_secs())]
    Timeout { what: String, waited: Duration },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl TaskError {
    pub fn configuration(message: impl Into<String>) -> Self {
        TaskError::Configuration(message.into())
    }

    /// Wraps a collaborator failure with a short description of what was attempted.
    pub fn external(context: impl Into<String>, source: impl Into<ExternalError>) -> Self {
        TaskError::ExternalCall {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        TaskError::Io {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let error = TaskError::external("failed to stop instance", "api error AccessDenied");
        assert_eq!(error.to_string(), "failed to stop instance: api error AccessDenied");
        assert!(error.source().is_some());

        let timeout = TaskError::Timeout {
            what: "image ami-1 to become available".into(),
            waited: Duration::from_secs(90),
        };
        assert_eq!(timeout.to_string(), "timed out after 90s waiting for image ami-1 to become available");

        let io = TaskError::io("failed to delete file", std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert_eq!(io.to_string(), "failed to delete file: missing");
    }
}
