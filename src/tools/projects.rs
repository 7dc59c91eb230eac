//! Project tools

use super::registry::ToolRegistry;
use super::{optional_str, required_str, ParamSpec, ParamType, Tool, ToolDefinition};
use crate::gitlab::client::encode_path;
use crate::gitlab::{GitLabClient, GitLabError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn register(registry: &mut ToolRegistry, client: &Arc<GitLabClient>) {
    registry.register(Arc::new(ListProjects {
        client: client.clone(),
    }));
    registry.register(Arc::new(GetProject {
        client: client.clone(),
    }));
}

/// Trim a project record to the fields an agent acts on.
fn summarize(project: &Value) -> Value {
    json!({
        "id": project["id"],
        "path_with_namespace": project["path_with_namespace"],
        "name": project["name"],
        "description": project["description"],
        "default_branch": project["default_branch"],
        "visibility": project["visibility"],
        "star_count": project["star_count"],
        "forks_count": project["forks_count"],
        "last_activity_at": project["last_activity_at"],
        "web_url": project["web_url"],
    })
}

struct ListProjects {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for ListProjects {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_projects".to_string(),
            description: "List projects visible to the authenticated user.".to_string(),
            parameters: vec![
                ParamSpec::new(
                    "search",
                    ParamType::String,
                    "Optional search term matched against project names and paths",
                ),
                ParamSpec::new(
                    "owned",
                    ParamType::Boolean,
                    "Optional: restrict to projects owned by the current user",
                ),
            ],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let mut query = vec![
            ("simple", "true".to_string()),
            ("per_page", "30".to_string()),
            ("order_by", "last_activity_at".to_string()),
        ];
        if let Some(search) = optional_str(&args, "search") {
            query.push(("search", search.to_string()));
        }
        if let Some(true) = args.get("owned").and_then(Value::as_bool) {
            query.push(("owned", "true".to_string()));
        }

        let projects = self.client.get("projects", &query, "projects").await?;
        let summaries: Vec<Value> = projects
            .as_array()
            .map(|list| list.iter().map(summarize).collect())
            .unwrap_or_default();
        Ok(json!(summaries))
    }
}

struct GetProject {
    client: Arc<GitLabClient>,
}

#[async_trait]
impl Tool for GetProject {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_project".to_string(),
            description: "Get a single project by its full path.".to_string(),
            parameters: vec![ParamSpec::new(
                "project_path",
                ParamType::String,
                "Full project path, e.g. 'group/repo'",
            )],
        }
    }

    async fn execute(&self, args: Value) -> Result<Value, GitLabError> {
        let path = required_str(&args, "project_path")?;
        let project = self
            .client
            .get(
                &format!("projects/{}", encode_path(path)),
                &[],
                &format!("project {path}"),
            )
            .await?;
        Ok(summarize(&project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry_for(server_uri: String) -> ToolRegistry {
        let client = Arc::new(GitLabClient::new(server_uri, "token"));
        let mut registry = ToolRegistry::new();
        register(&mut registry, &client);
        registry
    }

    async fn mock_auth(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v4/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "bot"})))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_get_project_reshapes_fields() {
        let server = MockServer::start().await;
        mock_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Frepo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "path_with_namespace": "group/repo",
                "name": "repo",
                "default_branch": "main",
                "web_url": "https://gitlab.example/group/repo",
                "namespace": {"kind": "group", "full_path": "group"},
                "permissions": {"project_access": null}
            })))
            .mount(&server)
            .await;

        let registry = registry_for(server.uri());
        let result = registry
            .call("get_project", json!({"project_path": "group/repo"}))
            .await
            .unwrap();

        assert_eq!(result["id"], 42);
        assert_eq!(result["default_branch"], "main");
        // Nested remote-only structures are not passed through.
        assert!(result.get("namespace").is_none());
    }

    #[tokio::test]
    async fn test_get_project_404_names_the_project() {
        let server = MockServer::start().await;
        mock_auth(&server).await;

        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fmissing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "message": "404 Project Not Found"
            })))
            .mount(&server)
            .await;

        let registry = registry_for(server.uri());
        let err = registry
            .call("get_project", json!({"project_path": "group/missing"}))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "NotFoundError");
        assert!(err.to_string().contains("group/missing"));
    }
}
