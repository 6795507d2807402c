//! One pass of the instruction state machine.

use opsblade_types::{DataMap, Document, MessageKind, TaskInfo, TaskResult};
use tracing::{debug, info, warn};

use super::{RunObserver, RunSettings};
use crate::{
    task::{TaskContext, TaskRegistry},
    variables::VariableStore,
};

pub(super) struct Run<'w> {
    pub settings: &'w RunSettings,
    pub registry: &'w TaskRegistry,
    pub variables: &'w mut VariableStore,
    pub observer: &'w mut dyn RunObserver,
}

impl Run<'_> {
    /// Resolves, dispatches and finalizes one instruction record.
    ///
    /// Returns `false` when the run must stop.
    pub fn step(&mut self, sequence: usize, record: &DataMap) -> bool {
        let mut context = self.context_for(sequence, record);

        if context.task.is_empty() {
            let message = format!("{}: Task type is missing or not a string", context.label());
            self.finish(context.error(&message, None));
            return false;
        }

        if flag(record, "skip") {
            let mut result = context.result(true, "Task skipped", Document::Null);
            result.message_type = MessageKind::TaskSkipped;
            return self.finish(result);
        }

        let registry = self.registry;
        let Some(constructor) = registry.get(&context.task) else {
            let message = format!("Invalid task: {}", context.task);
            self.finish(context.error(&message, None));
            return false;
        };

        context.instructions = match serde_json::to_vec(record) {
            Ok(payload) => payload,
            Err(error) => {
                self.finish(context.error("Failed to serialize task", Some(&error)));
                return false;
            }
        };

        let start = TaskInfo {
            message_type: MessageKind::TaskStart,
            sequence,
            name: context.name.clone(),
            task: context.task.clone(),
            msg: String::new(),
            instructions: without_credentials(record),
            debug: context.debug,
        };
        info!(sequence, task = %context.task, name = %context.name, "starting task");
        if !self.observer.on_start(&start) {
            warn!(sequence, task = %context.task, "start notification vetoed");
            return false;
        }

        let mut result = {
            let mut task = constructor(context, &*self.variables);
            task.execute()
        };
        result.message_type = MessageKind::TaskStop;

        if !result.no_vars && !result.data.is_empty() {
            debug!(sequence, keys = result.data.len(), "merging task data into variables");
            self.variables.extend(result.data.clone());
        }
        self.finish(result)
    }

    fn context_for(&self, sequence: usize, record: &DataMap) -> TaskContext {
        let env = match text(record, "env") {
            env if env.is_empty() => self.settings.env.clone(),
            env => env,
        };
        TaskContext {
            env,
            dry_run: self.settings.dry_run,
            debug: self.settings.debug,
            name: text(record, "name"),
            task: text(record, "task"),
            sequence,
            instructions: Vec::new(),
            error_message: text(record, "error_message"),
            credentials: self.settings.credentials.clone(),
        }
    }

    /// Emits the stop notification; the run continues only on success without a veto.
    fn finish(&mut self, result: TaskResult) -> bool {
        if result.success {
            info!(sequence = result.sequence, task = %result.task, name = %result.name, kind = %result.message_type, "task finished");
        } else {
            warn!(sequence = result.sequence, task = %result.task, name = %result.name, msg = %result.msg, "task failed");
        }

        let proceed = self.observer.on_stop(&result);
        if !proceed && result.success {
            warn!(sequence = result.sequence, "stop notification vetoed");
        }
        proceed && result.success
    }
}

fn text(record: &DataMap, key: &str) -> String {
    record.get(key).and_then(Document::as_str).unwrap_or_default().to_string()
}

fn flag(record: &DataMap, key: &str) -> bool {
    record.get(key).and_then(Document::as_bool).unwrap_or_default()
}

fn without_credentials(record: &DataMap) -> DataMap {
    let mut instructions = record.clone();
    instructions.remove("credentials");
    instructions
}
