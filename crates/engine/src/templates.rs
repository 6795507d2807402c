//! # Variable Templating
//!
//! Strings may reference variables with `{{name}}` markers. [`Templater`]
//! replaces each marker with the variable's text form, consulting three
//! dynamic tokens first:
//!
//! - `{{date}}`: local date as `YYYYMMDD`
//! - `{{datetime}}`: local timestamp as `YYYYMMDDHHMMSS`
//! - `{{epoch}}`: Unix seconds
//!
//! Unknown names are replaced with an empty string. After every replacement the
//! scan restarts from the beginning of the string, so a variable whose value
//! contains another marker is expanded as well. Expansion stops with an error
//! after [`MAX_SUBSTITUTIONS`] replacements.
//!
//! The [`Rewrite`] trait applies substitution to every string inside a typed
//! value while preserving its shape.
//!
//! ```rust
//! use opsblade_engine::templates::{Rewrite, Templater};
//! use opsblade_engine::variables::VariableStore;
//! use serde_json::json;
//!
//! let mut store = VariableStore::new();
//! store.set("app", "billing");
//!
//! let templater = Templater::new(&store);
//! let mut body = json!({"title": "Deploy {{app}}", "tags": ["{{app}}", 3]});
//! body.rewrite(&templater)?;
//! assert_eq!(body, json!({"title": "Deploy billing", "tags": ["billing", 3]}));
//! # Ok::<(), opsblade_engine::templates::TemplateError>(())
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use opsblade_types::{Credentials, Document, Filter, SelectionCriteria};
use thiserror::Error;

use crate::variables::VariableStore;

/// Upper bound on marker replacements within a single string.
pub const MAX_SUBSTITUTIONS: usize = 1024;

const MARKER_OPEN: &str = "{{";
const MARKER_CLOSE: &str = "}}";

/// Errors raised while expanding variable markers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("variable expansion exceeded {limit} substitutions at '{{{{{token}}}}}'; check for self-referencing variables")]
    SubstitutionLimit { limit: usize, token: String },
}

/// Expands `{{name}}` markers against a borrowed variable store.
#[derive(Debug, Clone, Copy)]
pub struct Templater<'a> {
    variables: &'a VariableStore,
    now: Option<DateTime<Local>>,
}

impl<'a> Templater<'a> {
    pub fn new(variables: &'a VariableStore) -> Self {
        Self { variables, now: None }
    }

    /// Pins the clock used by the dynamic tokens.
    pub fn with_now(mut self, now: DateTime<Local>) -> Self {
        self.now = Some(now);
        self
    }

    /// Replaces every `{{name}}` marker in `input`.
    ///
    /// The first `{{` and the first `}}` are located on every pass; if either is
    /// missing, or the closing marker comes first, the remaining text is
    /// returned unchanged.
    pub fn substitute(&self, input: &str) -> Result<String, TemplateError> {
        let mut output = input.to_string();
        let mut replacements = 0;

        loop {
            let (Some(start), Some(end)) = (output.find(MARKER_OPEN), output.find(MARKER_CLOSE)) else {
                break;
            };
            if start > end {
                break;
            }
            let token = &output[start + MARKER_OPEN.len()..end];
            if replacements == MAX_SUBSTITUTIONS {
                return Err(TemplateError::SubstitutionLimit {
                    limit: MAX_SUBSTITUTIONS,
                    token: token.to_string(),
                });
            }
            let value = self.resolve(token.trim());
            output.replace_range(start..end + MARKER_CLOSE.len(), &value);
            replacements += 1;
        }

        Ok(output)
    }

    fn resolve(&self, name: &str) -> String {
        let now = || self.now.unwrap_or_else(Local::now);
        match name {
            "date" => now().format("%Y%m%d").to_string(),
            "datetime" => now().format("%Y%m%d%H%M%S").to_string(),
            "epoch" => now().timestamp().to_string(),
            _ => self.variables.get_string(name),
        }
    }
}

/// Applies variable substitution to every string a value owns.
///
/// Implementations must leave the shape of the value untouched: maps keep their
/// keys, lists keep their length, and only string leaves change.
pub trait Rewrite {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError>;
}

impl Rewrite for String {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        if self.contains(MARKER_OPEN) {
            *self = templater.substitute(self)?;
        }
        Ok(())
    }
}

impl Rewrite for Document {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        match self {
            Document::String(text) => text.rewrite(templater),
            Document::Array(items) => items.rewrite(templater),
            Document::Object(map) => {
                for value in map.values_mut() {
                    value.rewrite(templater)?;
                }
                Ok(())
            }
            Document::Null | Document::Bool(_) | Document::Number(_) => Ok(()),
        }
    }
}

impl<T: Rewrite> Rewrite for Option<T> {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        match self {
            Some(value) => value.rewrite(templater),
            None => Ok(()),
        }
    }
}

impl<T: Rewrite> Rewrite for Vec<T> {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.iter_mut().try_for_each(|item| item.rewrite(templater))
    }
}

impl<K: Ord, T: Rewrite> Rewrite for BTreeMap<K, T> {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.values_mut().try_for_each(|value| value.rewrite(templater))
    }
}

impl<K, T: Rewrite, S: BuildHasher> Rewrite for HashMap<K, T, S> {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.values_mut().try_for_each(|value| value.rewrite(templater))
    }
}

impl<K, T: Rewrite, S> Rewrite for IndexMap<K, T, S> {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.values_mut().try_for_each(|value| value.rewrite(templater))
    }
}

macro_rules! rewrite_is_noop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Rewrite for $ty {
                fn rewrite(&mut self, _templater: &Templater<'_>) -> Result<(), TemplateError> {
                    Ok(())
                }
            }
        )*
    };
}

rewrite_is_noop!(bool, i32, i64, u32, u64, usize, f64);

impl Rewrite for SelectionCriteria {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.field.rewrite(templater)?;
        self.compare.rewrite(templater)?;
        self.value.rewrite(templater)
    }
}

impl Rewrite for Filter {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.name.rewrite(templater)?;
        self.values.rewrite(templater)
    }
}

impl Rewrite for Credentials {
    fn rewrite(&mut self, templater: &Templater<'_>) -> Result<(), TemplateError> {
        self.sections_mut().try_for_each(|section| section.rewrite(templater))
    }
}
