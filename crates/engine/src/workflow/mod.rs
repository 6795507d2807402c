//! Workflow loading and sequential execution.
//!
//! A [`Workflow`] holds run-level settings and an ordered list of untyped
//! instruction records. [`Workflow::execute`] walks the records strictly in
//! order, dispatching each one to the task registered under its `task` field
//! and merging the task's data into the run's [`VariableStore`]. The first
//! failed task, or the first vetoed notification, ends the run.
//!
//! ```rust,no_run
//! use opsblade_engine::workflow::Workflow;
//!
//! let mut workflow = Workflow::new().with_dry_run(true);
//! workflow.load_file("deploy.yaml")?;
//! let succeeded = workflow.execute();
//! # Ok::<(), opsblade_engine::workflow::WorkflowError>(())
//! ```

mod observer;
mod run;

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use opsblade_types::{Credentials, DataMap, WorkflowDocument};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use observer::{ConsoleObserver, RunObserver};

use crate::{task::TaskRegistry, variables::VariableStore};
use run::Run;

/// Errors raised while loading instructions.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("unable to read file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error reading workflow input: {0}")]
    Input(#[source] io::Error),

    #[error("deserialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("deserialization failure: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings shared by every instruction of a run.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunSettings {
    pub env: String,
    pub dry_run: bool,
    pub debug: bool,
    pub json: bool,
    pub credentials: Credentials,
}

/// A loaded workflow ready to execute.
pub struct Workflow {
    settings: RunSettings,
    tasks: Vec<DataMap>,
    registry: TaskRegistry,
    observer: Option<Box<dyn RunObserver>>,
    variables: VariableStore,
}

impl Default for Workflow {
    fn default() -> Self {
        Self::new()
    }
}

impl Workflow {
    /// An empty workflow backed by the built-in task registry.
    pub fn new() -> Self {
        Self {
            settings: RunSettings::default(),
            tasks: Vec::new(),
            registry: TaskRegistry::with_builtin_tasks(),
            observer: None,
            variables: VariableStore::new(),
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.settings.dry_run = dry_run;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.settings.debug = debug;
        self
    }

    /// Prints notifications as pretty JSON when no observer is installed.
    pub fn with_json(mut self, json: bool) -> Self {
        self.settings.json = json;
        self
    }

    /// Routes notifications to `observer` instead of the console.
    pub fn with_observer(mut self, observer: impl RunObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn with_registry(mut self, registry: TaskRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replaces the loaded instructions with the contents of a YAML file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<(), WorkflowError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| WorkflowError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&text)
    }

    /// Replaces the loaded instructions with a YAML document read to the end of `reader`.
    pub fn load_reader(&mut self, mut reader: impl Read) -> Result<(), WorkflowError> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(WorkflowError::Input)?;
        self.load_str(&text)
    }

    /// Replaces the loaded instructions with a YAML (or JSON) document.
    ///
    /// Document booleans can only switch modes on; a flag already set on the
    /// builder stays set.
    pub fn load_str(&mut self, text: &str) -> Result<(), WorkflowError> {
        let document = WorkflowDocument::from_yaml_str(text)?;
        if !document.env.is_empty() {
            self.settings.env = document.env;
        }
        self.settings.dry_run |= document.dryrun;
        self.settings.debug |= document.debug;
        self.settings.json |= document.json;
        self.settings.credentials = document.credentials;
        self.tasks = document.tasks;
        debug!(tasks = self.tasks.len(), env = %self.settings.env, "loaded workflow");
        Ok(())
    }

    pub fn add_task(&mut self, task: DataMap) {
        self.tasks.push(task);
    }

    pub fn add_task_json(&mut self, task: &[u8]) -> Result<(), WorkflowError> {
        self.add_task(serde_json::from_slice(task)?);
        Ok(())
    }

    pub fn add_task_yaml(&mut self, task: &str) -> Result<(), WorkflowError> {
        self.add_task(serde_yaml::from_str(task)?);
        Ok(())
    }

    pub fn tasks(&self) -> &[DataMap] {
        &self.tasks
    }

    pub fn dry_run(&self) -> bool {
        self.settings.dry_run
    }

    pub fn debug(&self) -> bool {
        self.settings.debug
    }

    pub fn json(&self) -> bool {
        self.settings.json
    }

    /// Variables accumulated by the tasks of the most recent run.
    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    /// Renders the run settings and every loaded instruction as pretty JSON.
    pub fn dump(&self) -> String {
        let mut out = format!(
            "Global dryrun: {}\nGlobal debug: {}\n",
            self.settings.dry_run, self.settings.debug
        );
        for (index, task) in self.tasks.iter().enumerate() {
            let section = match serde_json::to_string_pretty(task) {
                Ok(rendered) => format!("Task {}:\n{rendered}\n\n", index + 1),
                Err(error) => format!("Failed to marshal task {}: {error}\n", index + 1),
            };
            out.push_str(&section);
        }
        out
    }

    /// Runs every loaded instruction in order.
    ///
    /// Every run starts from an empty variable table. Returns `true` only when
    /// every task succeeded and no notification was vetoed.
    pub fn execute(&mut self) -> bool {
        self.variables = VariableStore::new();
        info!(tasks = self.tasks.len(), dry_run = self.settings.dry_run, env = %self.settings.env, "starting workflow");

        let mut console = ConsoleObserver::new(self.settings.json);
        let observer: &mut dyn RunObserver = match self.observer.as_deref_mut() {
            Some(observer) => observer,
            None => &mut console,
        };
        let mut run = Run {
            settings: &self.settings,
            registry: &self.registry,
            variables: &mut self.variables,
            observer,
        };

        for (index, record) in self.tasks.iter().enumerate() {
            if !run.step(index + 1, record) {
                warn!(sequence = index + 1, "workflow terminated");
                return false;
            }
        }
        info!("workflow complete");
        true
    }
}
