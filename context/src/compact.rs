//! Compact, indentation-based text serialization for context payloads.
//!
//! Grammar, with a two-space indent unit:
//! - scalar field: `key value`
//! - object or list field: `key`, then its children one level deeper
//! - list of objects: a header line of field names taken from the first
//!   object, then one space-joined value line per object
//! - list of scalars: one value per line
//!
//! Inside table rows, list values render as `[a,b]` and missing fields as
//! empty cells. Values are written verbatim: spaces and newlines inside a
//! value are not escaped, so the output is for reading, not for parsing back.

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

const INDENT: &str = "  ";

/// Serialize any value through its JSON representation
pub fn to_compact_string<T: Serialize>(value: &T) -> Result<String> {
    Ok(to_compact(&serde_json::to_value(value)?))
}

pub fn to_compact(value: &Value) -> String {
    let mut lines = Vec::new();
    write_value(value, 0, &mut lines);
    lines.join("\n")
}

fn write_value(value: &Value, depth: usize, lines: &mut Vec<String>) {
    let indent = INDENT.repeat(depth);
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                match child {
                    Value::Object(_) | Value::Array(_) => {
                        lines.push(format!("{indent}{key}"));
                        write_value(child, depth + 1, lines);
                    }
                    scalar => lines.push(format!("{indent}{key} {}", cell(scalar))),
                }
            }
        }
        Value::Array(items) => write_list(items, depth, lines),
        scalar => lines.push(format!("{indent}{}", cell(scalar))),
    }
}

fn write_list(items: &[Value], depth: usize, lines: &mut Vec<String>) {
    let indent = INDENT.repeat(depth);
    let Some(Value::Object(first)) = items.first() else {
        lines.extend(items.iter().map(|item| format!("{indent}{}", cell(item))));
        return;
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    lines.push(format!("{indent}{}", headers.join(" ")));

    for item in items {
        let row = match item {
            Value::Object(map) => headers
                .iter()
                .map(|h| map.get(*h).map(cell).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(" "),
            other => cell(other),
        };
        lines.push(format!("{indent}{row}"));
    }
}

/// Single-line rendering of one value
fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => {
            format!("[{}]", items.iter().map(cell).collect::<Vec<_>>().join(","))
        }
        Value::Object(_) | Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}
