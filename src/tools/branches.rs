//! Branch tools

use super::registry::ToolRegistry;
use super::{optional_str, required_str, ParamSpec, ParamType, Tool, ToolDefinition};
use crate::gitlab::client::encode_path;
use crate::gitlab::{GitLabClient, GitLabError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry, client: &Arc<GitLabClient>) {
    registry.register(Arc::new(ListBranches {
        client: client.clone(),
    }));
    registry.register(Arc::new(CreateBranch {
        client: client.clone(),
    }));
    registry.register(Arc::new(DeleteBranch {
        client: client.clone(),
    }));
}

fn summarize(branch: &Value) -> Value {
    json!({
        "name": branch["name"],
        "merged": branch["merged"],
        "protected": branch["protected"],
        "default": branch["default"],
        "commit_sha": branch["commit"]["short_id"],
        "commit_title": branch["commit"]["title"],
        "web_url": branch["web_url"],
    })
}

struct ListBranches {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for ListBranches {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_branches".to_string(),
            description: "List repository branches of a project.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new(
                    "search",
                    ParamType::String,
                    "Optional substring filter on branch names",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let mut query = vec![("per_page", "50".to_string())];
        if let Some(search) = optional_str(&args, "search") {
            query.push(("search", search.to_string()));
        }

        let branches = self
            .client
            .get(
                &format!("projects/{}/repository/branches", encode_path(path)),
                &query,
                &format!("project {path}"),
            )
            .await?;
        let summaries: Vec<Value> = branches
            .as_array()
            .map(|list| list.iter().map(summarize).collect())
            .unwrap_or_default();
        Ok(json!(summaries))
    }
}

struct CreateBranch {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for CreateBranch {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_branch".to_string(),
            description: "Create a new branch from a ref.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("branch_name", ParamType::String, "Name of the new branch"),
                ParamSpec::new(
                    "ref",
                    ParamType::String,
                    "Source branch name or commit SHA to branch from",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let branch = required_str(&args, "branch_name")?;
        let source = required_str(&args, "ref")?;

        let created = self
            .client
            .post(
                &format!("projects/{}/repository/branches", encode_path(path)),
                &json!({"branch": branch, "ref": source}),
                &format!("ref {source} of project {path}"),
            )
            .await?;
        Ok(summarize(&created))
    }
}

/// Destructive (elicitation-gated, severity `warning`): unmerged commits
/// on the branch are gone once it is deleted.
struct DeleteBranch {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for DeleteBranch {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "delete_branch".to_string(),
            description: "Permanently delete a branch.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("branch_name", ParamType::String, "Name of the branch"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let branch = required_str(&args, "branch_name")?;

        self.client
            .delete(
                &format!(
                    "projects/{}/repository/branches/{}",
                    encode_path(path),
                    encode_path(branch)
                ),
                &format!("branch {branch} of project {path}"),
            )
            .await?;
        Ok(json!({"deleted": true, "branch": branch}))
    }
}
