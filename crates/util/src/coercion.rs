//! Scalar coercions over untyped JSON documents.
//!
//! Variables and task data are stored as `serde_json::Value` trees, while most
//! consumers want a plain string, integer, flag, map, or list. The functions here
//! apply one fixed coercion table so templating and typed variable reads agree.

use std::collections::BTreeMap;

use serde_json::Value;

/// Formats a JSON value as text.
///
/// - strings are returned as-is
/// - numbers use their shortest decimal form (`5`, `1.5`)
/// - booleans become `true` / `false`
/// - null becomes an empty string
/// - lists join their coerced elements with `,`
/// - maps join `key:value` pairs with `,`
///
/// # Example
/// ```rust
/// use opsblade_util::coercion::value_to_string;
/// use serde_json::json;
///
/// assert_eq!(value_to_string(&json!(["a", 1, true])), "a,1,true");
/// assert_eq!(value_to_string(&json!({"k": "v"})), "k:v");
/// ```
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(element_to_string).collect::<Vec<_>>().join(","),
        Value::Object(map) => map
            .iter()
            .map(|(key, nested)| format!("{key}:{}", element_to_string(nested)))
            .collect::<Vec<_>>()
            .join(","),
        scalar => scalar_to_string(scalar),
    }
}

/// Coerces a JSON value to an integer; anything that is not a number or a
/// decimal integer string yields zero. Fractional numbers are truncated.
pub fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_u64().map(|unsigned| unsigned.min(i64::MAX as u64) as i64))
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64))
            .unwrap_or_default(),
        Value::String(text) => text.parse::<i64>().unwrap_or_default(),
        _ => 0,
    }
}

/// Coerces a JSON value to a boolean.
///
/// Booleans pass through, non-zero numbers are true, and strings accept the
/// usual spellings (`1`, `t`, `true`, `0`, `f`, `false` in any case).
pub fn value_to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|float| float != 0.0),
        Value::String(text) => parse_bool(text).unwrap_or(false),
        _ => false,
    }
}

/// Coerces a JSON value to a string map.
///
/// Map values are coerced with [`value_to_string`]; lists are keyed by index;
/// a scalar is stored under the key `"0"`; null yields an empty map.
pub fn value_to_string_map(value: &Value) -> BTreeMap<String, String> {
    match value {
        Value::Null => BTreeMap::new(),
        Value::Object(map) => map.iter().map(|(key, nested)| (key.clone(), element_to_string(nested))).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, nested)| (index.to_string(), element_to_string(nested)))
            .collect(),
        scalar => BTreeMap::from([("0".to_string(), scalar_to_string(scalar))]),
    }
}

/// Coerces a JSON value to a list of strings.
///
/// Lists keep their order; maps become `key:value` entries; scalars become a
/// single-element list; null yields an empty list.
pub fn value_to_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().map(element_to_string).collect(),
        Value::Object(map) => map
            .iter()
            .map(|(key, nested)| format!("{key}:{}", element_to_string(nested)))
            .collect(),
        scalar => vec![scalar_to_string(scalar)],
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Nested compound values inside a list or map render as compact JSON.
fn element_to_string(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => value.to_string(),
        scalar => scalar_to_string(scalar),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => {
            if number.is_i64() || number.is_u64() {
                number.to_string()
            } else {
                number.as_f64().map(|float| format!("{float}")).unwrap_or_else(|| number.to_string())
            }
        }
        Value::Bool(flag) => flag.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
