use std::fs;

use opsblade_types::{Document, TaskResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prepare;
use crate::{
    task::{Task, TaskContext, TaskError},
    templates::{Rewrite, TemplateError, Templater},
    variables::VariableStore,
};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct DeleteInstructions {
    filename: String,
}

impl Rewrite for DeleteInstructions {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.filename.rewrite(templater)
    }
}

/// Deletes a single local file.
pub struct FileDelete<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn file_delete<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(FileDelete { context, variables })
}

impl FileDelete<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: DeleteInstructions = prepare(&self.context, self.variables)?;
        let filename = instructions.filename;
        if filename.is_empty() {
            return Err(TaskError::configuration("unable to delete, filename is empty"));
        }

        if self.context.dry_run {
            return Ok(self
                .context
                .result(true, format!("Dry run: would delete file: {filename}"), Document::Null));
        }

        fs::remove_file(&filename).map_err(|error| TaskError::io("failed to delete file", error))?;
        debug!(%filename, "deleted file");
        Ok(self.context.result(true, format!("Deleted {filename}"), Document::Null))
    }
}

impl Task for FileDelete<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::testing::context_for;
    use serde_json::json;

    #[test]
    fn deletes_an_existing_file() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("stale.json");
        fs::write(&path, "{}").expect("write");

        let context = context_for("file_delete", json!({"filename": path.to_string_lossy()}));
        let result = file_delete(context, &VariableStore::new()).execute();

        assert!(result.success, "{}", result.msg);
        assert!(result.msg.starts_with("Deleted "));
        assert!(!path.exists());
    }

    #[test]
    fn dry_run_leaves_the_file_in_place() {
        let directory = tempfile::tempdir().expect("tempdir");
        let path = directory.path().join("keep.json");
        fs::write(&path, "{}").expect("write");

        let mut context = context_for("file_delete", json!({"filename": path.to_string_lossy()}));
        context.dry_run = true;
        let result = file_delete(context, &VariableStore::new()).execute();

        assert!(result.success);
        assert_eq!(result.msg, format!("Dry run: would delete file: {}", path.to_string_lossy()));
        assert!(path.exists());
    }

    #[test]
    fn empty_filename_fails() {
        let result = file_delete(context_for("file_delete", json!({})), &VariableStore::new()).execute();
        assert!(!result.success);
        assert_eq!(result.msg, "unable to delete, filename is empty");
    }

    #[test]
    fn missing_file_fails_with_the_custom_error_message() {
        let directory = tempfile::tempdir().expect("tempdir");
        let mut context = context_for(
            "file_delete",
            json!({"filename": directory.path().join("absent").to_string_lossy()}),
        );
        context.error_message = "cleanup step could not run".into();

        let result = file_delete(context, &VariableStore::new()).execute();
        assert!(!result.success);
        assert!(result.msg.starts_with("failed to delete file: "));
        assert!(result.msg.ends_with("\n\ncleanup step could not run\n"));
    }
}
