//! Run-scoped variable table.
//!
//! A [`VariableStore`] is created once per run, receives every task's result
//! data, and backs `{{name}}` substitution. Reads never fail: an absent name
//! yields the zero value of the requested type.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use opsblade_types::{DataMap, Document};
use opsblade_util::coercion::{value_to_bool, value_to_i64, value_to_string, value_to_string_list, value_to_string_map};

/// Name → document mapping with overwrite-on-write semantics.
///
/// Insertion order is preserved so dumps list variables in the order they were
/// first set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableStore {
    values: IndexMap<String, Document>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Document>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Document> {
        self.values.get(name)
    }

    /// Text form of a variable; lists and maps are joined with `,`.
    pub fn get_string(&self, name: &str) -> String {
        self.get(name).map(value_to_string).unwrap_or_default()
    }

    /// Integer form of a variable, zero when absent or out of range.
    pub fn get_int(&self, name: &str) -> i32 {
        i32::try_from(self.get_int64(name)).unwrap_or_default()
    }

    pub fn get_int64(&self, name: &str) -> i64 {
        self.get(name).map(value_to_i64).unwrap_or_default()
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).is_some_and(value_to_bool)
    }

    pub fn get_map(&self, name: &str) -> BTreeMap<String, String> {
        self.get(name).map(value_to_string_map).unwrap_or_default()
    }

    pub fn get_list(&self, name: &str) -> Vec<String> {
        self.get(name).map(value_to_string_list).unwrap_or_default()
    }

    /// Copies every variable into a single map document.
    pub fn snapshot(&self) -> Document {
        Document::Object(self.values.iter().map(|(name, value)| (name.clone(), value.clone())).collect())
    }

    /// Merges task data into the store; later values win on collision.
    pub fn extend(&mut self, data: DataMap) {
        self.values.extend(data);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Document)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_overwrites_unconditionally() {
        let mut store = VariableStore::new();
        store.set("region", "us-east-1");
        store.set("region", "eu-west-1");
        assert_eq!(store.get_string("region"), "eu-west-1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn absent_names_read_as_zero_values() {
        let store = VariableStore::new();
        assert_eq!(store.get_string("missing"), "");
        assert_eq!(store.get_int("missing"), 0);
        assert!(!store.get_bool("missing"));
        assert!(store.get_map("missing").is_empty());
        assert!(store.get_list("missing").is_empty());
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn typed_reads_apply_the_coercion_table() {
        let mut store = VariableStore::new();
        store.set("ids", json!(["i-1", "i-2"]));
        store.set("count", json!("42"));
        store.set("large", json!(5_000_000_000_i64));
        store.set("enabled", json!("true"));
        store.set("tags", json!({"env": "prod"}));

        assert_eq!(store.get_string("ids"), "i-1,i-2");
        assert_eq!(store.get_list("ids"), vec!["i-1".to_string(), "i-2".to_string()]);
        assert_eq!(store.get_int("count"), 42);
        assert_eq!(store.get_int("large"), 0);
        assert_eq!(store.get_int64("large"), 5_000_000_000);
        assert!(store.get_bool("enabled"));
        assert_eq!(store.get_string("tags"), "env:prod");
        assert_eq!(store.get_map("tags").get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn extend_merges_and_snapshot_reflects_all_values() {
        let mut store = VariableStore::new();
        store.set("a", 1);
        let data = match json!({"a": 2, "b": "x"}) {
            Document::Object(map) => map,
            _ => DataMap::new(),
        };
        store.extend(data);

        assert_eq!(store.snapshot(), json!({"a": 2, "b": "x"}));
        assert_eq!(store.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
