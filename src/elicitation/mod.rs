//! Elicitation - confirmation gating for destructive tools
//!
//! A static table maps each destructive tool to a message template and a
//! severity. Callers ask `requires_confirmation` / `create_request` before
//! dispatching; the registry itself never blocks execution, it only
//! supplies what a caller needs to block it. Read-only tools are never in
//! the table.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// How heavyweight the confirmation UI should be.
///
/// `Warning` marks irreversible or destructive actions (deleting a branch
/// or pipeline); `Info` marks reversible state transitions with a lower
/// blast radius (closing an issue, merging an approved merge request), so
/// a caller can show a lighter prompt for those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("info"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

/// Confirmation policy for one destructive tool.
#[derive(Debug, Clone)]
pub struct ElicitationConfig {
    pub tool_name: &'static str,
    /// Template with `{placeholder}` slots filled from the call arguments.
    pub message_template: &'static str,
    pub severity: Severity,
    /// Symbolic guard a caller may evaluate to skip the prompt. Advisory
    /// only; never evaluated here.
    pub condition: Option<&'static str>,
}

/// One instantiated confirmation prompt, ready for the caller to act on.
#[derive(Debug, Clone, Serialize)]
pub struct ElicitationRequest {
    pub tool_name: String,
    pub message: String,
    pub severity: Severity,
    /// Substitution values, retained for audit.
    pub arguments: Map<String, Value>,
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder pattern"));

static CONFIGS: Lazy<HashMap<&'static str, ElicitationConfig>> = Lazy::new(|| {
    let entries = [
        ElicitationConfig {
            tool_name: "delete_branch",
            message_template:
                "Delete branch '{branch_name}' from {project_path}? The branch and any \
                 unmerged commits on it will be permanently removed.",
            severity: Severity::Warning,
            condition: None,
        },
        ElicitationConfig {
            tool_name: "delete_pipeline",
            message_template:
                "Delete pipeline #{pipeline_id} from {project_path}? Its jobs, logs and \
                 artifacts will be permanently removed.",
            severity: Severity::Warning,
            condition: None,
        },
        ElicitationConfig {
            tool_name: "close_issue",
            message_template: "Close issue #{issue_iid} in {project_path}?",
            severity: Severity::Info,
            condition: None,
        },
        ElicitationConfig {
            tool_name: "merge_merge_request",
            message_template:
                "Merge merge request !{merge_request_iid} in {project_path}? The source \
                 branch will be merged into its target.",
            severity: Severity::Info,
            condition: Some("state == opened"),
        },
        ElicitationConfig {
            tool_name: "cancel_pipeline",
            message_template: "Cancel the running pipeline #{pipeline_id} in {project_path}?",
            severity: Severity::Info,
            condition: None,
        },
    ];
    entries.into_iter().map(|c| (c.tool_name, c)).collect()
});

/// Registry of confirmation policies. Stateless; all lookups hit the
/// static table.
pub struct ElicitationRegistry;

impl ElicitationRegistry {
    /// True iff the tool has a confirmation policy.
    pub fn requires_confirmation(tool_name: &str) -> bool {
        CONFIGS.contains_key(tool_name)
    }

    pub fn get_config(tool_name: &str) -> Option<&'static ElicitationConfig> {
        CONFIGS.get(tool_name)
    }

    /// Fill the tool's template from the call arguments. Placeholders with
    /// no matching argument are left verbatim. Unknown tools get a generic
    /// non-empty message rather than an error.
    pub fn format_message(tool_name: &str, arguments: &Map<String, Value>) -> String {
        let Some(config) = CONFIGS.get(tool_name) else {
            return format!("Confirm execution of '{tool_name}'?");
        };

        PLACEHOLDER
            .replace_all(config.message_template, |caps: &regex::Captures<'_>| {
                match arguments.get(&caps[1]) {
                    Some(value) => render(value),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Build a confirmation request for a configured tool; `None` for
    /// anything else, which callers treat as "proceed without confirmation".
    pub fn create_request(
        tool_name: &str,
        arguments: Map<String, Value>,
    ) -> Option<ElicitationRequest> {
        let config = CONFIGS.get(tool_name)?;
        Some(ElicitationRequest {
            tool_name: tool_name.to_string(),
            message: Self::format_message(tool_name, &arguments),
            severity: config.severity,
            arguments,
        })
    }
}

/// Render an argument value for prompt text: bare strings stay unquoted,
/// everything else uses its JSON form.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
