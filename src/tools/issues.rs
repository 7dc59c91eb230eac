//! Issue tools

use super::registry::ToolRegistry;
use super::{optional_str, required_str, required_u64, ParamSpec, ParamType, Tool, ToolDefinition};
use crate::gitlab::client::encode_path;
use crate::gitlab::{GitLabClient, GitLabError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry, client: &Arc<GitLabClient>) {
    registry.register(Arc::new(ListIssues {
        client: client.clone(),
    }));
    registry.register(Arc::new(GetIssue {
        client: client.clone(),
    }));
    registry.register(Arc::new(CreateIssue {
        client: client.clone(),
    }));
    registry.register(Arc::new(CloseIssue {
        client: client.clone(),
    }));
}

fn summarize(issue: &Value) -> Value {
    json!({
        "iid": issue["iid"],
        "title": issue["title"],
        "state": issue["state"],
        "author": issue["author"]["username"],
        "labels": issue["labels"],
        "created_at": issue["created_at"],
        "updated_at": issue["updated_at"],
        "web_url": issue["web_url"],
    })
}

struct ListIssues {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for ListIssues {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_issues".to_string(),
            description: "List issues of a project.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new(
                    "state",
                    ParamType::String,
                    "Optional state filter: 'opened' or 'closed'",
                ),
                ParamSpec::new(
                    "labels",
                    ParamType::String,
                    "Optional comma-separated label filter",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let mut query = vec![("per_page", "30".to_string())];
        if let Some(state) = optional_str(&args, "state") {
            query.push(("state", state.to_string()));
        }
        if let Some(labels) = optional_str(&args, "labels") {
            query.push(("labels", labels.to_string()));
        }

        let issues = self
            .client
            .get(
                &format!("projects/{}/issues", encode_path(path)),
                &query,
                &format!("project {path}"),
            )
            .await?;
        let summaries: Vec<Value> = issues
            .as_array()
            .map(|list| list.iter().map(summarize).collect())
            .unwrap_or_default();
        Ok(json!(summaries))
    }
}

struct GetIssue {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for GetIssue {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_issue".to_string(),
            description: "Get a single issue, including its description.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("issue_iid", ParamType::Integer, "Project-local issue iid"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let iid = required_u64(&args, "issue_iid")?;
        let issue = self
            .client
            .get(
                &format!("projects/{}/issues/{iid}", encode_path(path)),
                &[],
                &format!("issue #{iid} of project {path}"),
            )
            .await?;

        let mut summary = summarize(&issue);
        summary["description"] = issue["description"].clone();
        summary["assignees"] = json!(issue["assignees"]
            .as_array()
            .map(|a| a.iter().map(|u| u["username"].clone()).collect::<Vec<_>>())
            .unwrap_or_default());
        Ok(summary)
    }
}

struct CreateIssue {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for CreateIssue {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_issue".to_string(),
            description: "Create a new issue in a project.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("title", ParamType::String, "Issue title"),
                ParamSpec::new(
                    "description",
                    ParamType::String,
                    "Optional issue body in Markdown",
                ),
                ParamSpec::new(
                    "labels",
                    ParamType::String,
                    "Optional comma-separated labels to apply",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let title = required_str(&args, "title")?;

        let mut body = json!({"title": title});
        if let Some(description) = optional_str(&args, "description") {
            body["description"] = json!(description);
        }
        if let Some(labels) = optional_str(&args, "labels") {
            body["labels"] = json!(labels);
        }

        let issue = self
            .client
            .post(
                &format!("projects/{}/issues", encode_path(path)),
                &body,
                &format!("project {path}"),
            )
            .await?;
        Ok(summarize(&issue))
    }
}

/// Destructive (elicitation-gated, severity `info`): reversible by
/// reopening the issue.
struct CloseIssue {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for CloseIssue {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "close_issue".to_string(),
            description: "Close an open issue.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("issue_iid", ParamType::Integer, "Project-local issue iid"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let iid = required_u64(&args, "issue_iid")?;
        let issue = self
            .client
            .put(
                &format!("projects/{}/issues/{iid}", encode_path(path)),
                &json!({"state_event": "close"}),
                &format!("issue #{iid} of project {path}"),
            )
            .await?;
        Ok(summarize(&issue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions() {
        let client = Arc::new(GitLabClient::new("https://gitlab.example", "t"));
        let mut registry = ToolRegistry::new();
        register(&mut registry, &client);

        let names: Vec<_> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["list_issues", "get_issue", "create_issue", "close_issue"]
        );

        // Filters are optional, the project path never is.
        let defs = registry.definitions();
        let list = defs.iter().find(|d| d.name == "list_issues").unwrap();
        assert!(list.parameters[0].is_required());
        assert!(!list.parameters[1].is_required());
        assert!(!list.parameters[2].is_required());
    }
}
