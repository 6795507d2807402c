//! Path-based field projection.
//!
//! [`project`] extracts a caller-specified subset of a document. Every key of
//! the projected map is one of the caller's field specs, spelled exactly as
//! requested. Paths are matched case-insensitively.
//!
//! Supported spec shapes:
//! - `name`: a top-level key, or the first key with that name found while walking
//! - `placement.zone`: a nested path; list elements are addressed by index (`items.0.id`)
//! - `items.*.id`: wildcard flatten; one `{ "id": .. }` map per list element that has the field
//! - `volumes.size`: dot notation over a list; the suffix is resolved per element into a list

use opsblade_types::{DataMap, Document};
use serde::Serialize;

use crate::document::{NormalizeError, join_path, keys_match, normalize, strip_prefix_ignore_case};

/// Projects the requested fields out of `value`.
///
/// With no specs the whole normalized document is returned unchanged.
///
/// # Example
/// ```rust
/// use opsblade_engine::fields::project;
/// use serde_json::json;
///
/// let response = json!({"items": [{"id": 1, "name": "a"}, {"name": "b"}, {"id": 3}]});
/// let projected = project(&response, &["items.*.id"])?;
/// assert_eq!(projected, json!({"items.*.id": [{"id": 1}, {"id": 3}]}));
/// # Ok::<(), opsblade_engine::document::NormalizeError>(())
/// ```
pub fn project<T, S>(value: &T, specs: &[S]) -> Result<Document, NormalizeError>
where
    T: Serialize + ?Sized,
    S: AsRef<str>,
{
    let document = normalize(value)?;
    if specs.is_empty() {
        return Ok(document);
    }
    Ok(project_document(&document, specs))
}

/// Projects the requested fields out of an already normalized document.
pub fn project_document<S: AsRef<str>>(document: &Document, specs: &[S]) -> Document {
    if specs.is_empty() {
        return document.clone();
    }
    let specs = deconflict_fields(specs);
    let mut output = DataMap::new();
    collect_fields(document, "", &specs, &mut output);
    Document::Object(output)
}

/// Removes redundant field specs.
///
/// A spec is dropped when another requested spec is a case-insensitive dot
/// prefix of it (`tags` makes `tags.env` redundant) or when it repeats an
/// earlier spec in a different case. Surviving specs keep the caller's spelling
/// and order.
pub fn deconflict_fields<S: AsRef<str>>(specs: &[S]) -> Vec<String> {
    let mut unique: Vec<&str> = Vec::new();
    for spec in specs {
        let spec: &str = spec.as_ref();
        if !unique.iter().any(|kept| keys_match(kept, spec)) {
            unique.push(spec);
        }
    }

    unique
        .iter()
        .filter(|spec| {
            !unique
                .iter()
                .any(|other| strip_prefix_ignore_case(spec, other).is_some_and(|rest| rest.starts_with('.')))
        })
        .map(|spec| spec.to_string())
        .collect()
}

fn collect_fields(node: &Document, path: &str, specs: &[String], output: &mut DataMap) {
    if !path.is_empty()
        && let Some(spec) = matching_spec(specs, path)
    {
        output.insert(spec.clone(), node.clone());
    }

    match node {
        Document::Object(map) => collect_from_map(node, map, path, specs, output),
        Document::Array(items) => collect_from_list(items, path, specs, output),
        _ => {}
    }
}

fn collect_from_map(node: &Document, map: &DataMap, path: &str, specs: &[String], output: &mut DataMap) {
    for (key, child) in map {
        // A bare key anywhere in the tree; the first occurrence in walk order wins.
        if let Some(spec) = matching_spec(specs, key) {
            output.entry(spec.clone()).or_insert_with(|| child.clone());
        }
        collect_fields(child, &join_path(path, key), specs, output);
    }

    if path.is_empty() {
        return;
    }
    for (spec, suffix) in dotted_suffixes(specs, path) {
        if output.contains_key(spec) {
            continue;
        }
        if let Some(value) = resolve_suffix(node, suffix) {
            output.insert(spec.clone(), value);
        }
    }
}

fn collect_from_list(items: &[Document], path: &str, specs: &[String], output: &mut DataMap) {
    let anchored: Vec<(&String, &str)> = specs
        .iter()
        .filter_map(|spec| wildcard_suffix(spec, path).map(|suffix| (spec, suffix)))
        .collect();

    if !anchored.is_empty() {
        for (spec, suffix) in anchored {
            let flattened = flatten_elements(items, suffix);
            if !flattened.is_empty() {
                output.insert(spec.clone(), Document::Array(flattened));
            }
        }
        return;
    }

    for (index, item) in items.iter().enumerate() {
        collect_fields(item, &join_path(path, &index.to_string()), specs, output);
    }

    if path.is_empty() {
        return;
    }
    for (spec, suffix) in dotted_suffixes(specs, path) {
        if output.contains_key(spec) {
            continue;
        }
        let values: Vec<Document> = items.iter().filter_map(|item| resolve_suffix(item, suffix)).collect();
        if !values.is_empty() {
            output.insert(spec.clone(), Document::Array(values));
        }
    }
}

/// One small map per element holding the resolved suffix; elements without it are omitted.
fn flatten_elements(items: &[Document], suffix: &str) -> Vec<Document> {
    if suffix.is_empty() {
        return items.to_vec();
    }
    let suffix_specs = [suffix.to_string()];
    items
        .iter()
        .filter_map(|item| {
            let mut element = DataMap::new();
            collect_fields(item, "", &suffix_specs, &mut element);
            (!element.is_empty()).then_some(Document::Object(element))
        })
        .collect()
}

fn resolve_suffix(node: &Document, suffix: &str) -> Option<Document> {
    let mut captured = DataMap::new();
    collect_fields(node, "", &[suffix.to_string()], &mut captured);
    captured.remove(suffix)
}

fn matching_spec<'a>(specs: &'a [String], path: &str) -> Option<&'a String> {
    specs.iter().find(|spec| keys_match(spec, path))
}

/// Suffix of a spec anchored as `<path>.*` at this list, or `None` when the spec does not anchor here.
fn wildcard_suffix<'a>(spec: &'a str, path: &str) -> Option<&'a str> {
    let anchor = join_path(path, "*");
    let rest = strip_prefix_ignore_case(spec, &anchor)?;
    if rest.is_empty() { Some(rest) } else { rest.strip_prefix('.') }
}

fn dotted_suffixes<'a>(specs: &'a [String], path: &str) -> Vec<(&'a String, &'a str)> {
    let prefix = format!("{path}.");
    specs
        .iter()
        .filter_map(|spec| {
            strip_prefix_ignore_case(spec, &prefix)
                .filter(|suffix| !suffix.is_empty())
                .map(|suffix| (spec, suffix))
        })
        .collect()
}
