//! Built-in local tasks.
//!
//! | id               | purpose                                              |
//! |------------------|------------------------------------------------------|
//! | `variables_set`  | sets variables from literal values                   |
//! | `variables_dump` | reports (a projection of) the current variables      |
//! | `variables_save` | writes variables to a JSON file                      |
//! | `variables_load` | reads variables from a JSON file                     |
//! | `file_delete`    | deletes a file                                       |
//! | `sleep`          | pauses the run                                       |
//! | `exit_if`        | stops the run when the variables match criteria      |
//! | `dryrun_or_die`  | refuses to continue unless dry-run is enabled        |
//! | `cmd_exec`       | runs a local command and captures its output         |
//! | `example`        | selects and projects a fixed mock listing            |

pub mod cmd;
pub mod example;
pub mod file;
pub mod misc;
pub mod variables;

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    task::{TaskContext, TaskError, TaskRegistry},
    templates::{Rewrite, Templater},
    variables::VariableStore,
};

/// Registers every built-in task constructor.
pub fn register_builtin_tasks(registry: &mut TaskRegistry) {
    registry.register("variables_set", variables::variables_set);
    registry.register("variables_dump", variables::variables_dump);
    registry.register("variables_save", variables::variables_save);
    registry.register("variables_load", variables::variables_load);
    registry.register("file_delete", file::file_delete);
    registry.register("sleep", misc::sleep);
    registry.register("exit_if", misc::exit_if);
    registry.register("dryrun_or_die", misc::dryrun_or_die);
    registry.register("cmd_exec", cmd::cmd_exec);
    registry.register("example", example::example);
}

/// Decodes a task's own fields and expands the variables inside them.
///
/// In debug mode the expanded fields are logged as a `task_dump` record.
pub(crate) fn prepare<T>(context: &TaskContext, variables: &VariableStore) -> Result<T, TaskError>
where
    T: DeserializeOwned + Serialize + Rewrite,
{
    let mut instructions: T = context.decode_instructions()?;
    instructions.rewrite(&Templater::new(variables))?;
    if let Some(dump) = context.task_dump(&instructions) {
        debug!(sequence = context.sequence, task = %context.task, dump = %dump, "task dump");
    }
    Ok(instructions)
}

#[cfg(test)]
pub(crate) mod testing {
    use opsblade_types::Document;

    use crate::task::TaskContext;

    /// Context for invoking a task directly with the given instruction record.
    pub fn context_for(task: &str, instructions: Document) -> TaskContext {
        TaskContext {
            task: task.to_string(),
            sequence: 1,
            instructions: serde_json::to_vec(&instructions).unwrap_or_default(),
            ..TaskContext::default()
        }
    }
}
