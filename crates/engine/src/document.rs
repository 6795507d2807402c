//! Canonical document form shared by selection, projection, and templating.
//!
//! Any serializable value is converted into a [`Document`] through a serde
//! round-trip before it is inspected. Map keys are looked up exactly first and
//! then case-insensitively, so `Name` and `name` address the same field.

use opsblade_types::{DataMap, Document};
use serde::Serialize;
use thiserror::Error;

/// Raised when a value cannot be represented as a document.
#[derive(Debug, Error)]
#[error("failed to normalize value into a document: {0}")]
pub struct NormalizeError(#[from] serde_json::Error);

/// Converts any serializable value into its canonical document form.
///
/// Structs become maps keyed by their serialized field names and every numeric
/// subtype becomes a JSON number. Values that cannot be serialized (for example
/// maps with non-string keys) are reported instead of silently dropped.
pub fn normalize<T: Serialize + ?Sized>(value: &T) -> Result<Document, NormalizeError> {
    Ok(serde_json::to_value(value)?)
}

/// Coerces a document into a string-keyed map.
///
/// Maps pass through, lists are keyed by element index, null becomes an empty
/// map, and any other scalar is stored under the key `"0"`.
pub fn into_data_map(document: Document) -> DataMap {
    match document {
        Document::Object(map) => map,
        Document::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        Document::Null => DataMap::new(),
        scalar => DataMap::from_iter([("0".to_string(), scalar)]),
    }
}

/// Looks up a map key, preferring an exact match over a case-insensitive one.
pub fn lookup_key<'a>(map: &'a DataMap, key: &str) -> Option<&'a Document> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(candidate, _)| keys_match(candidate, key))
            .map(|(_, value)| value)
    })
}

/// Case-insensitive comparison used for keys, paths, and field specs.
pub(crate) fn keys_match(left: &str, right: &str) -> bool {
    left.eq_ignore_ascii_case(right) || left.to_lowercase() == right.to_lowercase()
}

/// Strips `prefix` from `text` ignoring case and returns the remainder in its original spelling.
pub(crate) fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    keys_match(head, prefix).then(|| &text[prefix.len()..])
}

/// Joins a parent path and a child segment with a dot.
pub(crate) fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}.{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_json::json;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Serialize)]
    struct Instance {
        instance_id: String,
        cpu_count: u8,
        load: f32,
        tags: BTreeMap<String, String>,
    }

    #[test]
    fn normalizes_structs_into_maps() {
        let instance = Instance {
            instance_id: "i-123".into(),
            cpu_count: 4,
            load: 0.5,
            tags: BTreeMap::from([("env".to_string(), "prod".to_string())]),
        };

        let document = normalize(&instance).expect("normalize");
        assert_eq!(document, json!({"instance_id": "i-123", "cpu_count": 4, "load": 0.5, "tags": {"env": "prod"}}));
    }

    #[test]
    fn reports_unrepresentable_values() {
        let invalid: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        assert!(normalize(&invalid).is_err());
    }

    #[test]
    fn coerces_documents_into_data_maps() {
        assert_eq!(into_data_map(json!({"a": 1})).get("a"), Some(&json!(1)));
        assert_eq!(into_data_map(json!(["x", "y"])).get("1"), Some(&json!("y")));
        assert_eq!(into_data_map(json!(true)).get("0"), Some(&json!(true)));
        assert!(into_data_map(Document::Null).is_empty());
    }

    #[test]
    fn key_lookup_prefers_exact_spelling() {
        let map = into_data_map(json!({"Name": "upper", "name": "lower", "Region": "us"}));
        assert_eq!(lookup_key(&map, "name"), Some(&json!("lower")));
        assert_eq!(lookup_key(&map, "REGION"), Some(&json!("us")));
        assert_eq!(lookup_key(&map, "zone"), None);
    }

    #[test]
    fn strips_prefixes_case_insensitively() {
        assert_eq!(strip_prefix_ignore_case("Items.*.Id", "items.*"), Some(".Id"));
        assert_eq!(strip_prefix_ignore_case("items", "items.*"), None);
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a", "0"), "a.0");
    }
}
