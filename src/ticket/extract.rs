//! Field extraction from raw tracker tickets.
//!
//! Tickets arrive as opaque JSON. Descriptions may be plain strings or
//! rich documents (`{"type": "doc", "content": [...]}`), and custom fields
//! live under arbitrary `customfield_*` keys whose human-readable names are
//! only available through a parallel `names` table. Every lookup here
//! degrades to "absent" on malformed input; nothing panics or errors.

use serde_json::{Map, Value};

/// Returned when a description has no extractable text.
pub const NO_DESCRIPTION: &str = "No description";

/// Key prefix of tracker-defined custom fields.
pub const CUSTOM_FIELD_PREFIX: &str = "customfield_";

const AFFECTED_REPO_MARKERS: &[&str] = &["repository", "affected"];
const ACCEPTANCE_MARKERS: &[&str] = &["acceptance"];

/// Flatten a ticket description into plain text.
///
/// Rich documents are walked exactly two levels deep (block nodes, then their
/// inline children); only `text` nodes carrying a string `text` attribute are
/// collected, joined with single spaces. Plain strings pass through unchanged.
/// Anything else yields [`NO_DESCRIPTION`].
pub fn extract_text(description: &Value) -> String {
    match description {
        Value::String(text) => text.clone(),
        Value::Object(root) if root.get("type").and_then(Value::as_str) == Some("doc") => {
            let texts: Vec<&str> = root
                .get("content")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|block| block.get("content").and_then(Value::as_array))
                .flatten()
                .filter(|node| node.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|node| node.get("text").and_then(Value::as_str))
                .collect();

            if texts.is_empty() {
                NO_DESCRIPTION.to_string()
            } else {
                texts.join(" ")
            }
        }
        _ => NO_DESCRIPTION.to_string(),
    }
}

/// Truthiness of a JSON value: `null`, `false`, `0`, and empty strings,
/// arrays and objects count as absent.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Find the "affected repositories" custom field.
///
/// A field qualifies only when its value is present *and* its display name
/// (from the ticket's `names` table) contains `repository` or `affected`,
/// case-insensitively. Without a `names` table nothing qualifies. The first
/// qualifying field in key order wins.
pub fn find_affected_repositories(raw_ticket: &Value) -> Option<Value> {
    find_custom_field(raw_ticket, AFFECTED_REPO_MARKERS).cloned()
}

/// Find an acceptance-criteria custom field and flatten it to text.
pub fn find_acceptance_criteria(raw_ticket: &Value) -> Option<String> {
    find_custom_field(raw_ticket, ACCEPTANCE_MARKERS).map(|value| match value {
        Value::String(text) => text.clone(),
        other => extract_text(other),
    })
}

fn find_custom_field<'a>(raw_ticket: &'a Value, markers: &[&str]) -> Option<&'a Value> {
    let fields = raw_ticket.get("fields").and_then(Value::as_object)?;
    let names = raw_ticket.get("names").and_then(Value::as_object);

    fields
        .iter()
        .filter(|(key, _)| key.starts_with(CUSTOM_FIELD_PREFIX))
        .find(|(key, value)| {
            is_present(value)
                && display_name(names, key).is_some_and(|name| {
                    let name = name.to_lowercase();
                    markers.iter().any(|marker| name.contains(marker))
                })
        })
        .map(|(_, value)| value)
}

fn display_name<'a>(names: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a str> {
    names?.get(key)?.as_str().filter(|name| !name.is_empty())
}
