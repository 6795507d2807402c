//! Criteria-based selection over documents.
//!
//! A list of [`SelectionCriteria`] is evaluated with AND semantics. Each
//! criterion names a dot-separated path, an operator, and an operand. Paths are
//! resolved case-insensitively at every level and a `*` segment matches when
//! any element of the list at that position satisfies the rest of the path.
//!
//! Leaf comparison is dispatched on the kind of the document leaf:
//!
//! - **strings** support every operator; `equals`, `contains`, and `begins`
//!   ignore case, `not` is an exact inequality, `greater`/`less` compare
//!   lexicographically, and the temporal operators parse the leaf as a date
//! - **numbers** support `equals`, `not`, `greater`, and `less`
//! - **booleans** support `equals` and `not`
//!
//! An operand of the wrong kind never matches. An unknown operator is an error.

use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeDelta, Utc};
use opsblade_types::{Document, SelectionCriteria};
use opsblade_util::parse_possible_date;
use serde::Serialize;
use thiserror::Error;

use crate::document::{NormalizeError, lookup_key, normalize};

/// Operators accepted in the `compare` field of a criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOperator {
    Equals,
    Not,
    Contains,
    Greater,
    Less,
    Begins,
    After,
    Before,
    DaysOld,
    MinutesOld,
}

impl CompareOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOperator::Equals => "equals",
            CompareOperator::Not => "not",
            CompareOperator::Contains => "contains",
            CompareOperator::Greater => "greater",
            CompareOperator::Less => "less",
            CompareOperator::Begins => "begins",
            CompareOperator::After => "after",
            CompareOperator::Before => "before",
            CompareOperator::DaysOld => "days_old",
            CompareOperator::MinutesOld => "minutes_old",
        }
    }
}

impl fmt::Display for CompareOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an operator outside the supported set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown comparison operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for CompareOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "equals" | "equal" => Ok(CompareOperator::Equals),
            "not" => Ok(CompareOperator::Not),
            "contains" => Ok(CompareOperator::Contains),
            "greater" => Ok(CompareOperator::Greater),
            "less" => Ok(CompareOperator::Less),
            "begins" => Ok(CompareOperator::Begins),
            "after" => Ok(CompareOperator::After),
            "before" => Ok(CompareOperator::Before),
            "days_old" => Ok(CompareOperator::DaysOld),
            "minutes_old" => Ok(CompareOperator::MinutesOld),
            _ => Err(UnknownOperator(s.to_string())),
        }
    }
}

/// Errors raised while evaluating selection criteria.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("invalid selection criteria for field '{field}': {source}")]
    InvalidOperator {
        field: String,
        #[source]
        source: UnknownOperator,
    },
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Normalizes `value` and evaluates `criteria` against it.
///
/// An empty criteria list always matches.
///
/// # Example
/// ```rust
/// use opsblade_engine::select::select;
/// use opsblade_types::SelectionCriteria;
/// use serde_json::json;
///
/// let item = json!({"name": "web-1", "tags": [{"key": "env", "value": "prod"}]});
/// let criteria = vec![
///     SelectionCriteria::new("Name", "begins", "WEB"),
///     SelectionCriteria::new("tags.*.value", "equals", "prod"),
/// ];
/// assert!(select(&item, &criteria)?);
/// # Ok::<(), opsblade_engine::select::SelectError>(())
/// ```
pub fn select<T: Serialize + ?Sized>(value: &T, criteria: &[SelectionCriteria]) -> Result<bool, SelectError> {
    if criteria.is_empty() {
        return Ok(true);
    }
    let document = normalize(value)?;
    select_document(&document, criteria)
}

/// Evaluates `criteria` against an already normalized document.
///
/// Every operator is validated before any criterion is evaluated, so an
/// invalid operator is reported even when an earlier criterion does not match.
pub fn select_document(document: &Document, criteria: &[SelectionCriteria]) -> Result<bool, SelectError> {
    let operators = criteria
        .iter()
        .map(|criterion| {
            criterion
                .compare
                .parse::<CompareOperator>()
                .map_err(|source| SelectError::InvalidOperator {
                    field: criterion.field.clone(),
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let now = Utc::now();
    for (criterion, operator) in criteria.iter().zip(operators) {
        let segments: Vec<&str> = criterion.field.split('.').collect();
        let comparison = Comparison {
            operator,
            operand: &criterion.value,
            now,
        };
        if !matches_path(document, &segments, &comparison) {
            return Ok(false);
        }
    }
    Ok(true)
}

struct Comparison<'a> {
    operator: CompareOperator,
    operand: &'a Document,
    now: DateTime<Utc>,
}

fn matches_path(node: &Document, segments: &[&str], comparison: &Comparison<'_>) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return compare_leaf(node, comparison);
    };

    match node {
        Document::Object(map) => lookup_key(map, segment).is_some_and(|child| matches_path(child, rest, comparison)),
        Document::Array(items) => {
            // A wildcard consumes its segment; any other segment is tried against every element.
            let remaining = if *segment == "*" { rest } else { segments };
            items.iter().any(|item| matches_path(item, remaining, comparison))
        }
        _ => false,
    }
}

fn compare_leaf(leaf: &Document, comparison: &Comparison<'_>) -> bool {
    match leaf {
        Document::String(text) => compare_string(text, comparison),
        Document::Number(number) => number
            .as_f64()
            .is_some_and(|value| compare_number(value, comparison.operator, comparison.operand)),
        Document::Bool(flag) => compare_bool(*flag, comparison.operator, comparison.operand),
        _ => false,
    }
}

fn compare_string(text: &str, comparison: &Comparison<'_>) -> bool {
    match comparison.operator {
        CompareOperator::DaysOld => is_older_than(text, comparison.operand, comparison.now, TimeDelta::try_days),
        CompareOperator::MinutesOld => is_older_than(text, comparison.operand, comparison.now, TimeDelta::try_minutes),
        operator => {
            let Some(operand) = comparison.operand.as_str() else {
                return false;
            };
            match operator {
                CompareOperator::Equals => text.to_lowercase() == operand.to_lowercase(),
                CompareOperator::Not => text != operand,
                CompareOperator::Contains => text.to_lowercase().contains(&operand.to_lowercase()),
                CompareOperator::Greater => text > operand,
                CompareOperator::Less => text < operand,
                CompareOperator::Begins => text.to_lowercase().starts_with(&operand.to_lowercase()),
                CompareOperator::After => compare_dates(text, operand).is_some_and(|(leaf, other)| leaf > other),
                CompareOperator::Before => compare_dates(text, operand).is_some_and(|(leaf, other)| leaf < other),
                CompareOperator::DaysOld | CompareOperator::MinutesOld => false,
            }
        }
    }
}

fn compare_number(value: f64, operator: CompareOperator, operand: &Document) -> bool {
    let Some(operand) = operand.as_f64() else {
        return false;
    };
    match operator {
        CompareOperator::Equals => value == operand,
        CompareOperator::Not => value != operand,
        CompareOperator::Greater => value > operand,
        CompareOperator::Less => value < operand,
        _ => false,
    }
}

fn compare_bool(flag: bool, operator: CompareOperator, operand: &Document) -> bool {
    let Some(operand) = operand.as_bool() else {
        return false;
    };
    match operator {
        CompareOperator::Equals => flag == operand,
        CompareOperator::Not => flag != operand,
        _ => false,
    }
}

fn compare_dates(leaf: &str, operand: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    Some((parse_possible_date(leaf)?, parse_possible_date(operand)?))
}

/// True when the leaf timestamp lies strictly before `now` minus the operand age.
fn is_older_than(leaf: &str, operand: &Document, now: DateTime<Utc>, unit: fn(i64) -> Option<TimeDelta>) -> bool {
    let Some(age) = operand_as_integer(operand).and_then(unit) else {
        return false;
    };
    let Some(cutoff) = now.checked_sub_signed(age) else {
        return false;
    };
    parse_possible_date(leaf).is_some_and(|timestamp| timestamp < cutoff)
}

/// Integer operand: integral number, truncated float, or decimal string.
fn operand_as_integer(operand: &Document) -> Option<i64> {
    match operand {
        Document::Number(number) => number.as_i64().or_else(|| number.as_f64().map(|value| value.trunc() as i64)),
        Document::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, SecondsFormat};
    use serde_json::json;

    fn criteria(field: &str, compare: &str, value: Document) -> Vec<SelectionCriteria> {
        vec![SelectionCriteria::new(field, compare, value)]
    }

    fn instance() -> Document {
        json!({
            "InstanceId": "i-0abc",
            "name": "web-server",
            "cpu": 4,
            "load": 0.75,
            "public": false,
            "LaunchTime": "2024-03-01T10:15:00Z",
            "tags": [
                {"key": "env", "value": "prod"},
                {"key": "team", "value": "ops"}
            ],
            "placement": {"zone": "us-east-1a"}
        })
    }

    #[test]
    fn empty_criteria_always_match() {
        assert!(select(&json!({"anything": 1}), &[]).expect("select"));
        assert!(select(&Document::Null, &[]).expect("select"));
    }

    #[test]
    fn field_names_resolve_case_insensitively() {
        let document = json!({"name": "alpha"});
        assert!(select(&document, &criteria("Name", "equals", json!("alpha"))).expect("select"));
        assert!(select(&instance(), &criteria("instanceid", "equals", json!("I-0ABC"))).expect("select"));
        assert!(select(&instance(), &criteria("Placement.Zone", "begins", json!("us-"))).expect("select"));
    }

    #[test]
    fn string_operators() {
        let document = instance();
        assert!(select(&document, &criteria("name", "contains", json!("SERVER"))).expect("select"));
        assert!(select(&document, &criteria("name", "not", json!("Web-Server"))).expect("select"));
        assert!(!select(&document, &criteria("name", "not", json!("web-server"))).expect("select"));
        assert!(select(&document, &criteria("name", "greater", json!("a"))).expect("select"));
        assert!(select(&document, &criteria("name", "less", json!("x"))).expect("select"));
        assert!(!select(&document, &criteria("name", "begins", json!("server"))).expect("select"));
    }

    #[test]
    fn number_and_bool_operators() {
        let document = instance();
        assert!(select(&document, &criteria("cpu", "equals", json!(4))).expect("select"));
        assert!(select(&document, &criteria("cpu", "equals", json!(4.0))).expect("select"));
        assert!(select(&document, &criteria("load", "greater", json!(0.5))).expect("select"));
        assert!(select(&document, &criteria("load", "less", json!(1))).expect("select"));
        assert!(select(&document, &criteria("public", "equals", json!(false))).expect("select"));
        assert!(select(&document, &criteria("public", "not", json!(true))).expect("select"));
        assert!(!select(&document, &criteria("cpu", "contains", json!(4))).expect("select"));
    }

    #[test]
    fn operand_kind_mismatch_is_not_a_match() {
        let document = instance();
        assert!(!select(&document, &criteria("cpu", "equals", json!("4"))).expect("select"));
        assert!(!select(&document, &criteria("name", "equals", json!(4))).expect("select"));
        assert!(!select(&document, &criteria("public", "equals", json!("false"))).expect("select"));
        assert!(!select(&document, &criteria("missing", "equals", json!("x"))).expect("select"));
        assert!(!select(&document, &criteria("placement", "equals", json!("x"))).expect("select"));
    }

    #[test]
    fn wildcard_segments_match_any_element() {
        let document = instance();
        assert!(select(&document, &criteria("tags.*.value", "equals", json!("OPS"))).expect("select"));
        assert!(!select(&document, &criteria("tags.*.value", "equals", json!("dev"))).expect("select"));
        assert!(select(&document, &criteria("tags.key", "equals", json!("team"))).expect("select"));
        assert!(select(&json!({"ids": ["a", "b"]}), &criteria("ids.*", "equals", json!("b"))).expect("select"));
    }

    #[test]
    fn criteria_are_combined_with_and() {
        let document = instance();
        let both = vec![
            SelectionCriteria::new("name", "begins", "web"),
            SelectionCriteria::new("cpu", "greater", 2),
        ];
        assert!(select(&document, &both).expect("select"));

        let one_fails = vec![
            SelectionCriteria::new("name", "begins", "web"),
            SelectionCriteria::new("cpu", "greater", 8),
        ];
        assert!(!select(&document, &one_fails).expect("select"));
    }

    #[test]
    fn invalid_operator_is_an_error() {
        let error = select(&instance(), &criteria("name", "matches", json!("web"))).expect_err("invalid operator");
        assert!(matches!(error, SelectError::InvalidOperator { ref field, .. } if field == "name"));
        assert!(error.to_string().contains("matches"));
    }

    #[test]
    fn invalid_operator_is_reported_before_evaluation() {
        let criteria = vec![
            SelectionCriteria::new("name", "equals", "nope"),
            SelectionCriteria::new("name", "bogus", "web"),
        ];
        assert!(select(&instance(), &criteria).is_err());
    }

    #[test]
    fn operators_parse_case_insensitively() {
        assert_eq!("EQUALS".parse::<CompareOperator>(), Ok(CompareOperator::Equals));
        assert_eq!("equal".parse::<CompareOperator>(), Ok(CompareOperator::Equals));
        assert_eq!("Days_Old".parse::<CompareOperator>(), Ok(CompareOperator::DaysOld));
        assert!("between".parse::<CompareOperator>().is_err());
    }

    #[test]
    fn temporal_operators_compare_parsed_dates() {
        let document = instance();
        assert!(select(&document, &criteria("LaunchTime", "after", json!("2024-02-29"))).expect("select"));
        assert!(select(&document, &criteria("LaunchTime", "before", json!("20240302"))).expect("select"));
        assert!(!select(&document, &criteria("LaunchTime", "after", json!("not a date"))).expect("select"));
        assert!(!select(&document, &criteria("name", "before", json!("2024-01-01"))).expect("select"));
    }

    #[test]
    fn days_old_compares_against_now() {
        let past = (Utc::now() - Duration::seconds(1)).to_rfc3339_opts(SecondsFormat::Millis, true);
        let future = (Utc::now() + Duration::days(1)).to_rfc3339_opts(SecondsFormat::Secs, true);

        assert!(select(&json!({"created": past}), &criteria("created", "days_old", json!(0))).expect("select"));
        assert!(!select(&json!({"created": future}), &criteria("created", "days_old", json!(0))).expect("select"));
    }

    #[test]
    fn age_operands_accept_numbers_and_strings() {
        let launched = json!({"launched": "2020-01-01T00:00:00Z"});
        assert!(select(&launched, &criteria("launched", "days_old", json!("30"))).expect("select"));
        assert!(select(&launched, &criteria("launched", "days_old", json!(30.9))).expect("select"));
        assert!(select(&launched, &criteria("launched", "minutes_old", json!(5))).expect("select"));
        assert!(!select(&launched, &criteria("launched", "days_old", json!("thirty"))).expect("select"));
        assert!(!select(&launched, &criteria("launched", "days_old", json!(true))).expect("select"));
    }
}
