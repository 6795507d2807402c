use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use super::{Task, TaskContext};
use crate::variables::VariableStore;

/// Builds a task for one invocation from its context and the run's variables.
pub type TaskConstructor = Box<dyn for<'a> Fn(TaskContext, &'a VariableStore) -> Box<dyn Task + 'a>>;

/// Name → constructor table consulted by the orchestrator.
///
/// Populated once before a run starts. Registering a name twice replaces the
/// earlier constructor.
#[derive(Default)]
pub struct TaskRegistry {
    constructors: IndexMap<String, TaskConstructor>,
}

impl TaskRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in local task.
    pub fn with_builtin_tasks() -> Self {
        let mut registry = Self::new();
        crate::tasks::register_builtin_tasks(&mut registry);
        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: for<'a> Fn(TaskContext, &'a VariableStore) -> Box<dyn Task + 'a> + 'static,
    {
        let name = name.into();
        if self.constructors.insert(name.clone(), Box::new(constructor)).is_some() {
            debug!(task = %name, "replaced previously registered task constructor");
        }
    }

    pub fn get(&self, name: &str) -> Option<&TaskConstructor> {
        self.constructors.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry").field("tasks", &self.constructors.keys().collect::<Vec<_>>()).finish()
    }
}
