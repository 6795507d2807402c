//! # OpsBlade Utilities
//!
//! Small, dependency-light helpers shared by the OpsBlade crates:
//!
//! - **`coercion`**: typed views over untyped JSON values
//! - **`date_handling`**: timestamp parsing across the accepted layouts
//! - **`text_processing`**: secret redaction and indented YAML rendering

pub mod coercion;
pub mod date_handling;
pub mod text_processing;

pub use coercion::{value_to_bool, value_to_i64, value_to_string, value_to_string_list, value_to_string_map};
pub use date_handling::parse_possible_date;
pub use text_processing::{redact_sensitive, render_yaml_block};
