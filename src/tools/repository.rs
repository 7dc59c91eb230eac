//! Repository content tools: code search and file retrieval.

use super::registry::ToolRegistry;
use super::{optional_str, required_str, ParamSpec, ParamType, Tool, ToolDefinition};
use crate::gitlab::client::encode_path;
use crate::gitlab::{GitLabClient, GitLabError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry, client: &Arc<GitLabClient>) {
    registry.register(Arc::new(SearchCode {
        client: client.clone(),
    }));
    registry.register(Arc::new(GetFileContents {
        client: client.clone(),
    }));
}

struct SearchCode {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for SearchCode {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_code".to_string(),
            description: "Search file contents within a project.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("query", ParamType::String, "Search query"),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let query = required_str(&args, "query")?;

        let blobs = self
            .client
            .get(
                &format!("projects/{}/search", encode_path(path)),
                &[("scope", "blobs".to_string()), ("search", query.to_string())],
                &format!("project {path}"),
            )
            .await?;

        let hits: Vec<Value> = blobs
            .as_array()
            .map(|list| {
                list.iter()
                    .map(|blob| {
                        json!({
                            "path": blob["path"],
                            "ref": blob["ref"],
                            "startline": blob["startline"],
                            "snippet": blob["data"],
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(json!(hits))
    }
}

struct GetFileContents {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for GetFileContents {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_file_contents".to_string(),
            description: "Read a file from the repository.".to_string(),
            parameters: vec![
                ParamSpec::new("project_path", ParamType::String, "Full project path"),
                ParamSpec::new("file_path", ParamType::String, "Path of the file in the repo"),
                ParamSpec::new(
                    "ref",
                    ParamType::String,
                    "Optional branch, tag or commit SHA; defaults to the default branch",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let project = required_str(&args, "project_path")?;
        let file = required_str(&args, "file_path")?;

        let mut query = Vec::new();
        if let Some(r) = optional_str(&args, "ref") {
            query.push(("ref", r.to_string()));
        }

        // The raw endpoint skips the base64 detour of the JSON file API.
        let content = self
            .client
            .get_raw(
                &format!(
                    "projects/{}/repository/files/{}/raw",
                    encode_path(project),
                    encode_path(file)
                ),
                &query,
                &format!("file {file} of project {project}"),
            )
            .await?;

        Ok(json!({
            "file_path": file,
            "ref": optional_str(&args, "ref"),
            "content": content,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn registry_for(server: &MockServer) -> ToolRegistry {
        Mock::given(method("GET"))
            .and(path("/api/v4/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "bot"})))
            .mount(server)
            .await;
        let client = Arc::new(GitLabClient::new(server.uri(), "token"));
        let mut registry = ToolRegistry::new();
        register(&mut registry, &client);
        registry
    }

    #[tokio::test]
    async fn test_search_code_reshapes_blobs() {
        let server = MockServer::start().await;
        let registry = registry_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Frepo/search"))
            .and(query_param("scope", "blobs"))
            .and(query_param("search", "fn main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "path": "src/main.rs",
                "ref": "main",
                "startline": 1,
                "data": "fn main() {}",
                "project_id": 42
            }])))
            .mount(&server)
            .await;

        let result = registry
            .call(
                "search_code",
                json!({"project_path": "group/repo", "query": "fn main"}),
            )
            .await
            .unwrap();

        assert_eq!(result[0]["path"], "src/main.rs");
        assert_eq!(result[0]["snippet"], "fn main() {}");
        assert!(result[0].get("project_id").is_none());
    }

    #[tokio::test]
    async fn test_get_file_contents_raw() {
        let server = MockServer::start().await;
        let registry = registry_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Frepo/repository/files/README.md/raw"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Hello\n"))
            .mount(&server)
            .await;

        let result = registry
            .call(
                "get_file_contents",
                json!({"project_path": "group/repo", "file_path": "README.md"}),
            )
            .await
            .unwrap();
        assert_eq!(result["content"], "# Hello\n");
    }
}
