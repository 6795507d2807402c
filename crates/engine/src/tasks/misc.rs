//! Flow-control tasks.

use std::{thread, time::Duration};

use opsblade_types::{Document, SelectionCriteria, TaskResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use super::prepare;
use crate::{
    select::select_document,
    task::{Task, TaskContext, TaskError},
    templates::{Rewrite, TemplateError, Templater},
    variables::VariableStore,
};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct SleepInstructions {
    sleep: i64,
}

impl Rewrite for SleepInstructions {
    fn rewrite(&mut self, _templater: &Templater<'_>) -> Result<(), TemplateError> {
        Ok(())
    }
}

/// Blocks the run for `sleep` seconds.
pub struct Sleep<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn sleep<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(Sleep { context, variables })
}

impl Sleep<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: SleepInstructions = prepare(&self.context, self.variables)?;
        let seconds = u64::try_from(instructions.sleep)
            .ok()
            .filter(|seconds| *seconds >= 1)
            .ok_or_else(|| TaskError::configuration("Sleep time must be one second or greater"))?;

        debug!(seconds, "sleeping");
        thread::sleep(Duration::from_secs(seconds));
        Ok(self
            .context
            .result(true, format!("Slept for {seconds} seconds"), Document::Null))
    }
}

impl Task for Sleep<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct ExitIfInstructions {
    select: Vec<SelectionCriteria>,
}

impl Rewrite for ExitIfInstructions {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.select.rewrite(templater)
    }
}

/// Fails, and so ends the run, when the current variables match `select`.
///
/// An empty `select` always matches.
pub struct ExitIf<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn exit_if<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(ExitIf { context, variables })
}

impl ExitIf<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: ExitIfInstructions = prepare(&self.context, self.variables)?;
        let matched = select_document(&self.variables.snapshot(), &instructions.select)?;
        let data = json!({ "exit_if_result": matched });

        if matched {
            info!(sequence = self.context.sequence, "exit condition met");
            return Ok(self.context.result(
                false,
                "Exit condition met, returning false to terminate workflow",
                data,
            ));
        }
        Ok(self.context.result(
            true,
            "Exit condition not met, returning true to continue workflow",
            data,
        ))
    }
}

impl Task for ExitIf<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}

/// Succeeds only when the run is a dry run.
pub struct DryRunOrDie {
    context: TaskContext,
}

pub fn dryrun_or_die<'a>(context: TaskContext, _variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(DryRunOrDie { context })
}

impl Task for DryRunOrDie {
    fn execute(&mut self) -> TaskResult {
        if self.context.dry_run {
            return self.context.result(true, "Dryrun is confirmed", Document::Null);
        }
        self.context.error("Dryrun is required but not enabled", None)
    }
}
