//! Merge request tools

use super::registry::ToolRegistry;
use super::{optional_str, required_str, required_u64, ParamSpec, ParamType, Tool, ToolDefinition};
use crate::gitlab::client::encode_path;
use crate::gitlab::{GitLabClient, GitLabError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry, client: &Arc<GitLabClient>) {
    registry.register(Arc::new(ListMergeRequests {
        client: client.clone(),
    }));
    registry.register(Arc::new(GetMergeRequest {
        client: client.clone(),
    }));
    registry.register(Arc::new(CreateMergeRequest {
        client: client.clone(),
    }));
    registry.register(Arc::new(MergeMergeRequest {
        client: client.clone(),
    }));
}

fn summarize(mr: &Value) -> Value {
    json!({
        "iid": mr["iid"],
        "title": mr["title"],
        "state": mr["state"],
        "source_branch": mr["source_branch"],
        "target_branch": mr["target_branch"],
        "author": mr["author"]["username"],
        "draft": mr["draft"],
        "merge_status": mr["detailed_merge_status"],
        "created_at": mr["created_at"],
        "web_url": mr["web_url"],
    })
}

struct ListMergeRequests {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for ListMergeRequests {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_merge_requests".to_string(),
            description: "List merge requests of a project.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new(
                    "state",
                    ParamType::String,
                    "Optional state filter: 'opened', 'closed' or 'merged'",
                ),
                ParamSpec::new(
                    "target_branch",
                    ParamType::String,
                    "Optional target branch filter",
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
        if let Some(target) = optional_str(&args, "target_branch") {
            query.push(("target_branch", target.to_string()));
        }

        let mrs = self
            .client
            .get(
                &format!("projects/{}/merge_requests", encode_path(path)),
                &query,
                &format!("project {path}"),
            )
            .await?;
        let summaries: Vec<Value> = mrs
            .as_array()
            .map(|list| list.iter().map(summarize).collect())
            .unwrap_or_default();
        Ok(json!(summaries))
    }
}

struct GetMergeRequest {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for GetMergeRequest {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_merge_request".to_string(),
            description: "Get a single merge request, including its description.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new(
                    "merge_request_iid",
                    ParamType::Integer,
                    "Project-local merge request iid",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let iid = required_u64(&args, "merge_request_iid")?;
        let mr = self
            .client
            .get(
                &format!("projects/{}/merge_requests/{iid}", encode_path(path)),
                &[],
                &format!("merge request !{iid} of project {path}"),
            )
            .await?;

        let mut summary = summarize(&mr);
        summary["description"] = mr["description"].clone();
        summary["has_conflicts"] = mr["has_conflicts"].clone();
        Ok(summary)
    }
}

struct CreateMergeRequest {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for CreateMergeRequest {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "create_merge_request".to_string(),
            description: "Open a merge request from a source branch to a target branch."
                .to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("source_branch", ParamType::String, "Branch to merge from"),
                ParamSpec::new("target_branch", ParamType::String, "Branch to merge into"),
                ParamSpec::new("title", ParamType::String, "Merge request title"),
                ParamSpec::new(
                    "description",
                    ParamType::String,
                    "Optional description in Markdown",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let source = required_str(&args, "source_branch")?;
        let target = required_str(&args, "target_branch")?;
        let title = required_str(&args, "title")?;

        let mut body = json!({
            "source_branch": source,
            "target_branch": target,
            "title": title,
        });
        if let Some(description) = optional_str(&args, "description") {
            body["description"] = json!(description);
        }

        let mr = self
            .client
            .post(
                &format!("projects/{}/merge_requests", encode_path(path)),
                &body,
                &format!("project {path}"),
            )
            .await?;
        Ok(summarize(&mr))
    }
}

/// Destructive (elicitation-gated, severity `info`): merging rewrites the
/// target branch but is an ordinary, reviewable state transition.
struct MergeMergeRequest {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for MergeMergeRequest {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "merge_merge_request".to_string(),
            description: "Merge an open merge request.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new(
                    "merge_request_iid",
                    ParamType::Integer,
                    "Project-local merge request iid",
                ),
                ParamSpec::new(
                    "merge_commit_message",
                    ParamType::String,
                    "Optional custom merge commit message",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let iid = required_u64(&args, "merge_request_iid")?;

        let mut body = json!({});
        if let Some(message) = optional_str(&args, "merge_commit_message") {
            body["merge_commit_message"] = json!(message);
        }

        let mr = self
            .client
            .put(
                &format!("projects/{}/merge_requests/{iid}/merge", encode_path(path)),
                &body,
                &format!("merge request !{iid} of project {path}"),
            )
            .await?;
        Ok(summarize(&mr))
    }
}
