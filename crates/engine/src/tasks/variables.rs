//! Tasks that read and write the variable table.

use std::{fs, path::Path};

use opsblade_types::{DataMap, Document, TaskResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::prepare;
use crate::{
    fields::project_document,
    task::{Task, TaskContext, TaskError},
    templates::{Rewrite, TemplateError, Templater},
    variables::VariableStore,
};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct SetInstructions {
    set: Vec<Assignment>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct Assignment {
    name: String,
    value: Document,
}

impl Rewrite for SetInstructions {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        for assignment in &mut self.set {
            assignment.name.rewrite(templater)?;
            assignment.value.rewrite(templater)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct FileInstructions {
    filename: String,
    fields: Vec<String>,
}

impl Rewrite for FileInstructions {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.filename.rewrite(templater)?;
        self.fields.rewrite(templater)
    }
}

impl FileInstructions {
    fn require_filename(&self) -> Result<&Path, TaskError> {
        if self.filename.is_empty() {
            return Err(TaskError::configuration("filename is required"));
        }
        Ok(Path::new(&self.filename))
    }
}

/// Returns every `set` entry as data; the orchestrator merges it into the store.
pub struct VariablesSet<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn variables_set<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(VariablesSet { context, variables })
}

impl VariablesSet<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: SetInstructions = prepare(&self.context, self.variables)?;
        let data: DataMap = instructions
            .set
            .into_iter()
            .map(|assignment| (assignment.name, assignment.value))
            .collect();
        Ok(self.context.result(true, "variables set", Document::Object(data)))
    }
}

impl Task for VariablesSet<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}

/// Reports the current variables, optionally projected to `fields`.
pub struct VariablesDump<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn variables_dump<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(VariablesDump { context, variables })
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct DumpInstructions {
    fields: Vec<String>,
}

impl Rewrite for DumpInstructions {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.fields.rewrite(templater)
    }
}

impl VariablesDump<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: DumpInstructions = prepare(&self.context, self.variables)?;
        let selected = project_document(&self.variables.snapshot(), &instructions.fields);
        Ok(self.context.result(true, "variables attached", selected))
    }
}

impl Task for VariablesDump<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}

/// Writes the (projected) variables to a JSON file.
///
/// The saved data is reported but not merged back into the store.
pub struct VariablesSave<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn variables_save<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(VariablesSave { context, variables })
}

impl VariablesSave<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: FileInstructions = prepare(&self.context, self.variables)?;
        let path = instructions.require_filename()?;
        let selected = project_document(&self.variables.snapshot(), &instructions.fields);

        if self.context.dry_run {
            return Ok(self
                .context
                .result(true, format!("Dry run: would save variables to {}", path.display()), Document::Null));
        }

        let mut encoded =
            serde_json::to_vec(&selected).map_err(|error| TaskError::external("failed to serialize variables", error))?;
        encoded.push(b'\n');
        fs::write(path, encoded).map_err(|error| TaskError::io("failed to write variables file", error))?;
        debug!(path = %path.display(), "saved variables");

        let mut result = self
            .context
            .result(true, format!("Saved variables to {}", path.display()), selected);
        result.no_vars = true;
        Ok(result)
    }
}

impl Task for VariablesSave<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}

/// Reads variables from a JSON object file, optionally projected to `fields`.
pub struct VariablesLoad<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn variables_load<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(VariablesLoad { context, variables })
}

impl VariablesLoad<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: FileInstructions = prepare(&self.context, self.variables)?;
        let path = instructions.require_filename()?;

        let contents = fs::read(path).map_err(|error| TaskError::io("failed to open file", error))?;
        let loaded: DataMap =
            serde_json::from_slice(&contents).map_err(|error| TaskError::external("failed to deserialize variables", error))?;

        let loaded = project_document(&Document::Object(loaded), &instructions.fields);
        Ok(self
            .context
            .result(true, format!("Loaded variables from {}", path.display()), loaded))
    }
}

impl Task for VariablesLoad<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}
