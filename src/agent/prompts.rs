//! Prompt templates sent to coding agents.
//!
//! - **Ticket prompt**: implement the change described by a `ProgrammingTask`
//! - **Marker prompt**: analyse a repository and write its `luigi.md` summary

use serde_json::Value;

use crate::marker::MARKER_FILE;
use crate::ticket::ProgrammingTask;

const NONE_SPECIFIED: &str = "None specified";

/// Build the prompt that asks an agent to resolve a ticket.
pub fn build_ticket_prompt(task: &ProgrammingTask) -> String {
    let affected = task
        .affected_repositories
        .as_ref()
        .map(describe_affected_repositories)
        .unwrap_or_else(|| NONE_SPECIFIED.to_string());
    let components = join_or(&task.components, NONE_SPECIFIED);
    let labels = join_or(&task.labels, "None");
    let acceptance = task
        .acceptance_criteria
        .as_deref()
        .unwrap_or(NONE_SPECIFIED);

    let mut prompt = String::new();
    prompt.push_str(
        "Based on this Jira ticket information, analyze the issue and implement a solution.\n\n",
    );
    prompt.push_str(&format!("JIRA TICKET: {}\n", task.issue_key));
    prompt.push_str(&format!("TITLE: {}\n", task.title));
    prompt.push_str(&format!("DESCRIPTION:\n{}\n\n", task.description));
    prompt.push_str(&format!("AFFECTED REPOSITORIES: {}\n", affected));
    prompt.push_str(&format!("COMPONENTS: {}\n", components));
    prompt.push_str(&format!("LABELS: {}\n\n", labels));
    prompt.push_str(&format!("ACCEPTANCE CRITERIA: {}\n\n", acceptance));
    prompt.push_str(
        "## You must follow these guidelines:\n\
         1. Analyze the issue to understand the root cause\n\
         2. Develop a plan to resolve the issue\n\
         3. Implement the necessary code changes\n\
         4. If appropriate, add tests to verify the fix works\n\
         5. Run the build and tests if they exist (package.json, pyproject.toml, Cargo.toml, etc.)\n\
         6. Think carefully about the code and the changes you are making, and make sure you are not missing anything\n\
         7. Follow the existing coding standards and conventions of the repository\n\
         8. Write code that is easy to understand and maintain\n\n\
         Focus on addressing the requirements in the ticket description and acceptance criteria.\n",
    );
    prompt
}

/// Build the prompt that asks an agent to write the repository marker file.
pub fn build_marker_prompt(repo_name: &str) -> String {
    format!(
        "Analyze the repository '{repo}' in the current directory and create a file named \
         `{marker}` at the repository root. The file is a navigation guide for other coding \
         agents that will later be asked to change this repository.\n\n\
         Read the code, configuration and documentation before writing. Fill in every section of \
         the template below, replacing each [PLACEHOLDER] with concrete findings. Do not modify \
         any other file.\n\n\
         # {repo}\n\n\
         ## Repository Overview\n[REPOSITORY_OVERVIEW: purpose, language(s), frameworks, how it is built and run]\n\n\
         ## Primary Functionality\n[PRIMARY_FUNCTIONALITY: the main features and workflows]\n\n\
         ## Business Domains\n[DOMAINS: business or problem domains this code serves]\n\n\
         ## Technical Concepts\n[TECHNICAL_CONCEPTS: key patterns, libraries, protocols, algorithms]\n\n\
         ## API Surface\n[API_SURFACE: endpoints, public functions, CLI commands, events]\n\n\
         ## Data Entities\n[DATA_ENTITIES: main models, schemas, tables and their relationships]\n\n\
         ## Repository Structure\n[STRUCTURE: important directories and files and what lives where]\n\n\
         ## UI Components\n[UI_COMPONENTS: screens and components, or 'None' for non-UI code]\n\n\
         ## Common Modification Patterns\n[MODIFICATION_PATTERNS: where to make typical changes, e.g. adding an endpoint or a field]\n\n\
         ## Search Keywords\n[SEARCH_KEYWORDS: terms that should lead a search to this repository]\n",
        repo = repo_name,
        marker = MARKER_FILE,
    )
}

/// Render an affected-repositories value for humans.
///
/// Multi-select custom fields arrive as `[{"value": "api"}, ...]`; strings and
/// `name`/`value` objects are unwrapped, anything else is shown as JSON.
pub fn describe_affected_repositories(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(describe_affected_repositories)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .get("value")
            .or_else(|| map.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

fn join_or(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}
