//! Tool Registry
//!
//! Single source of truth mapping a tool name to its definition and
//! executable handler. Built once at startup and only read afterwards, so
//! in-flight calls share it without locking.

use super::{schema, Tool, ToolDefinition};
use crate::gitlab::{GitLabClient, GitLabError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Listing entry: name and description only; parameters are exposed
/// through the derived schema, not here.
#[derive(Debug, Clone)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

/// Registry of all callable tools, preserving registration order.
pub struct ToolRegistry {
    order: Vec<String>,
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Last write wins: re-registering a name replaces
    /// the handler but keeps its original listing position.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        tracing::debug!("registering tool: {}", name);
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// `{name, description}` pairs in registration order.
    pub fn list(&self) -> Vec<ToolSummary> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                let def = tool.definition();
                ToolSummary {
                    name: def.name,
                    description: def.description,
                }
            })
            .collect()
    }

    /// Full definitions in registration order, for schema derivation.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Dispatch a call by name.
    ///
    /// Unknown names fail with the not-found variant rather than a panic
    /// or a generic error; required-argument checks run before the handler
    /// touches the network.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, GitLabError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| GitLabError::NotFound(format!("tool '{name}' not found")))?;

        for param in &tool.definition().parameters {
            if param.is_required() && args.get(&param.name).is_none() {
                return Err(GitLabError::Validation(format!(
                    "'{}' is required for {name}",
                    param.name
                )));
            }
        }

        tracing::info!(tool = name, "dispatching tool call");
        tool.execute(args).await
    }

    /// Render every tool's derived input schema, keyed by name.
    pub fn schemas(&self) -> Vec<(String, Value)> {
        self.definitions()
            .into_iter()
            .map(|def| {
                let schema = schema::input_schema(&def.parameters);
                (def.name, schema)
            })
            .collect()
    }

    /// Registry wired with the full GitLab tool set.
    pub fn with_gitlab_tools(client: Arc<GitLabClient>) -> Self {
        let mut registry = Self::new();

        super::projects::register(&mut registry, &client);
        super::issues::register(&mut registry, &client);
        super::merge_requests::register(&mut registry, &client);
        super::branches::register(&mut registry, &client);
        super::pipelines::register(&mut registry, &client);
        super::repository::register(&mut registry, &client);

        registry
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ParamSpec, ParamType};
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.to_string(),
                description: format!("Echoes '{}'", self.reply),
                parameters: vec![ParamSpec::new(
                    "message",
                    ParamType::String,
                    "Optional message to include",
                )],
            }
        }

        async fn execute(&self, _args: Value) -> Result<Value, GitLabError> {
            Ok(json!({"reply": self.reply}))
        }
    }

    #[tokio::test]
    async fn test_register_and_call() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            name: "echo",
            reply: "hi",
        }));

        assert!(registry.has_tool("echo"));
        let result = registry.call("echo", json!({})).await.unwrap();
        assert_eq!(result["reply"], "hi");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let err = registry.call("unknown_tool", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "NotFoundError");
        assert!(err.to_string().contains("unknown_tool"));
    }

    #[tokio::test]
    async fn test_reregistration_is_last_write_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool {
            name: "first",
            reply: "a",
        }));
        registry.register(Arc::new(EchoTool {
            name: "echo",
            reply: "old",
        }));
        registry.register(Arc::new(EchoTool {
            name: "echo",
            reply: "new",
        }));

        // Still one entry, original position, replaced handler.
        let names: Vec<_> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["first", "echo"]);

        let result = registry.call("echo", json!({})).await.unwrap();
        assert_eq!(result["reply"], "new");
    }

    #[tokio::test]
    async fn test_list_preserves_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["c_tool", "a_tool", "b_tool"] {
            registry.register(Arc::new(EchoTool { name, reply: "x" }));
        }
        let names: Vec<_> = registry.list().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["c_tool", "a_tool", "b_tool"]);
    }

    #[tokio::test]
    async fn test_missing_required_arg_is_validation() {
        struct Strict;

        #[async_trait]
        impl Tool for Strict {
            fn definition(&self) -> ToolDefinition {
                ToolDefinition {
                    name: "strict".to_string(),
                    description: "Needs an id".to_string(),
                    parameters: vec![ParamSpec::new("id", ParamType::Integer, "Numeric id")],
                }
            }

            async fn execute(&self, _args: Value) -> Result<Value, GitLabError> {
                unreachable!("validation rejects the call first");
            }
        }

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Strict));

        let err = registry.call("strict", json!({})).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }
}
