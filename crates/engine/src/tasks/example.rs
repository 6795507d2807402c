//! Reference task showing the standard instruction shape.
//!
//! It takes `credentials`, `filters`, `select`, and `fields`, runs selection
//! and projection over a fixed listing, and reports counts alongside the
//! projected items. New tasks can start from a copy of this file.

use opsblade_types::{Credentials, Document, Filter, SelectionCriteria, TaskResult};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::prepare;
use crate::{
    fields::project_document,
    select::select_document,
    task::{Task, TaskContext, TaskError},
    templates::{Rewrite, TemplateError, Templater},
    variables::VariableStore,
};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
struct ExampleInstructions {
    #[serde(skip_serializing)]
    credentials: Credentials,
    filters: Vec<Filter>,
    select: Vec<SelectionCriteria>,
    fields: Vec<String>,
}

impl Rewrite for ExampleInstructions {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.credentials.rewrite(templater)?;
        self.filters.rewrite(templater)?;
        self.select.rewrite(templater)?;
        self.fields.rewrite(templater)
    }
}

pub struct Example<'a> {
    context: TaskContext,
    variables: &'a VariableStore,
}

pub fn example<'a>(context: TaskContext, variables: &'a VariableStore) -> Box<dyn Task + 'a> {
    Box::new(Example { context, variables })
}

impl Example<'_> {
    fn run(&self) -> Result<TaskResult, TaskError> {
        let instructions: ExampleInstructions = prepare(&self.context, self.variables)?;
        let credentials = self.context.resolve_credentials(&instructions.credentials);
        debug!(credentials = ?credentials, filters = instructions.filters.len(), "example listing");

        let items = mock_items();
        let mut selected = Vec::new();
        for item in &items {
            if select_document(item, &instructions.select)? {
                selected.push(project_document(item, &instructions.fields));
            }
        }

        let data = json!({
            "mock_api_items": items.len(),
            "mock_selected_items": selected.len(),
            "mock_data": selected,
        });
        Ok(self.context.result(true, "example list", data))
    }
}

impl Task for Example<'_> {
    fn execute(&mut self) -> TaskResult {
        self.run().unwrap_or_else(|error| self.context.fail(error))
    }
}

fn mock_items() -> Vec<Document> {
    (1..=5)
        .map(|id| {
            json!({
                "name": format!("item{id}"),
                "id": id,
                "paid": if id % 2 == 1 { "yes" } else { "no" },
                "tags": {"tag1": format!("tag_value{id}"), "tag2": "yes"},
            })
        })
        .collect()
}
