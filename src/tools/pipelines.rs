//! Pipeline tools
//!
//! Retry and cancel are deliberate user-requested operations here, not a
//! failure-recovery mechanism: nothing in this crate retries a failed
//! remote call on its own.

use super::registry::ToolRegistry;
use super::{optional_str, required_str, required_u64, ParamSpec, ParamType, Tool, ToolDefinition};
use crate::gitlab::client::encode_path;
use crate::gitlab::{GitLabClient, GitLabError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry, client: &Arc<GitLabClient>) {
    registry.register(Arc::new(ListPipelines {
        client: client.clone(),
    }));
    registry.register(Arc::new(GetPipeline {
        client: client.clone(),
    }));
    registry.register(Arc::new(RetryPipeline {
        client: client.clone(),
    }));
    registry.register(Arc::new(CancelPipeline {
        client: client.clone(),
    }));
    registry.register(Arc::new(DeletePipeline {
        client: client.clone(),
    }));
}

fn summarize(pipeline: &Value) -> Value {
    json!({
        "id": pipeline["id"],
        "status": pipeline["status"],
        "ref": pipeline["ref"],
        "sha": pipeline["sha"],
        "source": pipeline["source"],
        "created_at": pipeline["created_at"],
        "updated_at": pipeline["updated_at"],
        "web_url": pipeline["web_url"],
    })
}

struct ListPipelines {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for ListPipelines {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_pipelines".to_string(),
            description: "List recent pipelines of a project.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new(
                    "status",
                    ParamType::String,
                    "Optional status filter, e.g. 'running', 'success', 'failed'",
                ),
                ParamSpec::new("ref", ParamType::String, "Optional ref filter"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let mut query = vec![("per_page", "30".to_string())];
        if let Some(status) = optional_str(&args, "status") {
            query.push(("status", status.to_string()));
        }
        if let Some(r) = optional_str(&args, "ref") {
            query.push(("ref", r.to_string()));
        }

        let pipelines = self
            .client
            .get(
                &format!("projects/{}/pipelines", encode_path(path)),
                &query,
                &format!("project {path}"),
            )
            .await?;
        let summaries: Vec<Value> = pipelines
            .as_array()
            .map(|list| list.iter().map(summarize).collect())
            .unwrap_or_default();
        Ok(json!(summaries))
    }
}

struct GetPipeline {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for GetPipeline {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_pipeline".to_string(),
            description: "Get a single pipeline with duration and coverage.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("pipeline_id", ParamType::Integer, "Pipeline id"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let id = required_u64(&args, "pipeline_id")?;
        let pipeline = self
            .client
            .get(
                &format!("projects/{}/pipelines/{id}", encode_path(path)),
                &[],
                &format!("pipeline #{id} of project {path}"),
            )
            .await?;

        let mut summary = summarize(&pipeline);
        summary["duration"] = pipeline["duration"].clone();
        summary["coverage"] = pipeline["coverage"].clone();
        Ok(summary)
    }
}

/// Re-run the failed jobs of a pipeline. User-requested, not automatic.
struct RetryPipeline {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for RetryPipeline {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "retry_pipeline".to_string(),
            description: "Retry the failed jobs of a pipeline.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("pipeline_id", ParamType::Integer, "Pipeline id"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let id = required_u64(&args, "pipeline_id")?;
        let pipeline = self
            .client
            .post(
                &format!("projects/{}/pipelines/{id}/retry", encode_path(path)),
                &json!({}),
                &format!("pipeline #{id} of project {path}"),
            )
            .await?;
        Ok(summarize(&pipeline))
    }
}

/// Destructive (elicitation-gated, severity `info`): stops running jobs.
struct CancelPipeline {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for CancelPipeline {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "cancel_pipeline".to_string(),
            description: "Cancel a running pipeline.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("pipeline_id", ParamType::Integer, "Pipeline id"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let id = required_u64(&args, "pipeline_id")?;
        let pipeline = self
            .client
            .post(
                &format!("projects/{}/pipelines/{id}/cancel", encode_path(path)),
                &json!({}),
                &format!("pipeline #{id} of project {path}"),
            )
            .await?;
        Ok(summarize(&pipeline))
    }
}

/// Destructive (elicitation-gated, severity `warning`): removes the
/// pipeline record with its jobs, logs and artifacts.
struct DeletePipeline {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for DeletePipeline {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "delete_pipeline".to_string(),
            description: "Permanently delete a pipeline, including jobs and artifacts."
                .to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("pipeline_id", ParamType::Integer, "Pipeline id"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let id = required_u64(&args, "pipeline_id")?;
        self.client
            .delete(
                &format!("projects/{}/pipelines/{id}", encode_path(path)),
                &format!("pipeline #{id} of project {path}"),
            )
            .await?;
        Ok(json!({"deleted": true, "pipeline_id": id}))
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
            vec![
                "list_pipelines",
                "get_pipeline",
                "retry_pipeline",
                "cancel_pipeline",
                "delete_pipeline"
            ]
        );
    }
}
