//! # Text Processing Utilities
//!
//! This module provides the text helpers used when rendering task notifications:
//! sensitive data redaction and indented YAML blocks.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Replacement token written in place of redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Redacts values that look like secrets in a string.
///
/// This function scans input text for patterns that commonly indicate
/// sensitive information like API keys, tokens, passwords, and webhook URLs.
/// When found, these values are replaced with `[REDACTED]` while preserving
/// the key names for debugging purposes.
///
/// # Arguments
/// * `input` - The input string that may contain sensitive information
///
/// # Returns
/// A new string with sensitive values redacted
///
/// # Example
/// ```rust
/// use opsblade_util::text_processing::redact_sensitive;
///
/// let input = "API_KEY=abc123 TOKEN=xyz789";
/// let redacted = redact_sensitive(input);
/// assert_eq!(redacted, "API_KEY=[REDACTED] TOKEN=[REDACTED]");
///
/// let input = "secret_access_key: wJalrXUtnFEMI";
/// assert_eq!(redact_sensitive(input), "secret_access_key: [REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    redact_sensitive_with(input, REDACTED)
}

/// Redacts sensitive-looking values, using a custom replacement token.
pub fn redact_sensitive_with(input: &str, replacement: &str) -> String {
    let mut redacted = input.to_string();

    for pattern in REDACT_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{replacement}")
            })
            .to_string();
    }

    redacted
}

/// Compiled redaction patterns. Group 1 is kept, the remainder of the match is replaced.
static REDACT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Bearer and basic credentials in headers.
        r"(?i)(authorization:\s+)(\S+(?:\s+\S+)?)",
        // KEY=value style assignments.
        r"(?i)\b([A-Z0-9_]*(?:KEY|TOKEN|SECRET|PASSWORD|PASSPHRASE)[A-Z0-9_]*=)(\S+)",
        // key: value style entries as emitted by YAML.
        r"(?im)^(\s*-?\s*[A-Za-z0-9_]*(?:key|token|secret|password|passphrase)[A-Za-z0-9_]*:[ \t]+)(\S.*)$",
        // Incoming webhook URLs carry their secret in the path.
        r"(https://hooks\.slack\.com/services/)(\S+)",
    ]
    .into_iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Renders a JSON value as YAML with every line prefixed by `indent`.
///
/// Blank lines are kept blank and the trailing newline emitted by the YAML
/// serializer is dropped. A value that cannot be rendered yields its compact
/// JSON form instead.
///
/// # Example
/// ```rust
/// use opsblade_util::text_processing::render_yaml_block;
/// use serde_json::json;
///
/// assert_eq!(render_yaml_block(&json!({"a": 1}), "  "), "  a: 1");
/// ```
pub fn render_yaml_block(value: &Value, indent: &str) -> String {
    let rendered = serde_yaml::to_string(value).unwrap_or_else(|_| value.to_string());
    indent_lines(rendered.trim_end_matches('\n'), indent)
}

/// Prefixes every non-empty line of `text` with `indent`.
pub fn indent_lines(text: &str, indent: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("{indent}{line}") })
        .collect::<Vec<_>>()
        .join("\n")
}
