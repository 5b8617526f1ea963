use serde::Serialize;
use serde_json::Value;

use super::extract::{
    extract_text, find_acceptance_criteria, find_affected_repositories, is_present,
};

/// Title used when a ticket has no summary.
pub const NO_TITLE: &str = "No title";

/// Canonical programming task built from one raw ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgrammingTask {
    pub issue_key: String,
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    pub components: Vec<String>,
    pub acceptance_criteria: Option<String>,
    pub affected_repositories: Option<Value>,
}

impl ProgrammingTask {
    /// A task may only be handed to an agent once it names affected repositories.
    pub fn is_actionable(&self) -> bool {
        self.affected_repositories.as_ref().is_some_and(is_present)
    }
}

/// Build a [`ProgrammingTask`] from a raw ticket. Pure; missing or
/// wrongly-typed fields fall back to defaults.
pub fn normalize(raw_ticket: &Value) -> ProgrammingTask {
    let fields = raw_ticket.get("fields");
    let field = |name: &str| fields.and_then(|f| f.get(name));

    ProgrammingTask {
        issue_key: raw_ticket
            .get("key")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        title: field("summary")
            .and_then(Value::as_str)
            .unwrap_or(NO_TITLE)
            .to_string(),
        description: extract_text(field("description").unwrap_or(&Value::Null)),
        labels: string_list(field("labels")),
        components: component_names(field("components")),
        acceptance_criteria: find_acceptance_criteria(raw_ticket),
        affected_repositories: find_affected_repositories(raw_ticket),
    }
}

/// Labels as plain strings; non-string entries are dropped.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// Components come back as objects (`{"name": "..."}`); bare strings are accepted too.
fn component_names(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(name) => Some(name.clone()),
                    other => other.get("name").and_then(Value::as_str).map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default()
}
