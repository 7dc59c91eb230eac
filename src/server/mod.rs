//! MCP server loop
//!
//! Line-delimited JSON-RPC 2.0 over stdio. Supported methods:
//! `initialize`, `notifications/initialized`, `tools/list`, `tools/call`.
//!
//! A failed tool call is answered with `isError` text content of the form
//! `Error executing {name}: {message}` instead of a protocol error, so one
//! bad remote call never ends the session.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::tools::registry::ToolRegistry;
use crate::tools::schema;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    /// Absent for notifications, which get no response.
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

fn response(id: Value, result: Value) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn error_response(id: Value, code: i32, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": JsonRpcError { code, message: message.into() },
    })
}

/// Dispatch one request. `None` means "no response" (a notification).
async fn handle_request(registry: &ToolRegistry, request: JsonRpcRequest) -> Option<Value> {
    let id = request.id.clone()?;

    let result = match request.method.as_str() {
        "initialize" => json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {"tools": {}},
            "serverInfo": {
                "name": "labgate",
                "version": env!("CARGO_PKG_VERSION"),
            },
        }),
        "ping" => json!({}),
        "tools/list" => {
            let tools: Vec<Value> = registry
                .definitions()
                .iter()
                .map(|def| {
                    json!({
                        "name": def.name,
                        "description": def.description,
                        "inputSchema": schema::input_schema(&def.parameters),
                    })
                })
                .collect();
            json!({"tools": tools})
        }
        "tools/call" => {
            let name = request
                .params
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let arguments = request
                .params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            match registry.call(&name, arguments).await {
                Ok(result) => {
                    let text = serde_json::to_string_pretty(&result)
                        .unwrap_or_else(|_| result.to_string());
                    json!({
                        "content": [{"type": "text", "text": text}],
                        "isError": false,
                    })
                }
                Err(err) => {
                    tracing::warn!(tool = %name, kind = err.kind(), "tool call failed: {err}");
                    json!({
                        "content": [{
                            "type": "text",
                            "text": format!("Error executing {name}: {err}"),
                        }],
                        "isError": true,
                    })
                }
            }
        }
        other => {
            return Some(error_response(
                id,
                -32601,
                format!("method not found: {other}"),
            ));
        }
    };

    Some(response(id, result))
}

/// Serve the registry over stdio until EOF.
pub async fn run(registry: ToolRegistry) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    tracing::info!(tools = registry.list().len(), "labgate MCP server ready");

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<JsonRpcRequest>(&line) {
            Ok(request) => handle_request(&registry, request).await,
            Err(e) => {
                tracing::warn!("unparseable request: {e}");
                Some(error_response(Value::Null, -32700, format!("parse error: {e}")))
            }
        };

        if let Some(reply) = reply {
            let mut payload = serde_json::to_string(&reply)?;
            payload.push('\n');
            stdout.write_all(payload.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gitlab::GitLabError;
    use crate::tools::{ParamSpec, ParamType, Tool, ToolDefinition};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "always_fails".to_string(),
                description: "Fails on purpose".to_string(),
                parameters: vec![],
            }
        }

        async fn execute(&self, _args: Value) -> Result<Value, GitLabError> {
            Err(GitLabError::Server {
                status: 503,
                message: "maintenance".to_string(),
            })
        }
    }

    struct OkTool;

    #[async_trait]
    impl Tool for OkTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "works".to_string(),
                description: "Succeeds".to_string(),
                parameters: vec![ParamSpec::new(
                    "label",
                    ParamType::String,
                    "Optional label",
                )],
            }
        }

        async fn execute(&self, _args: Value) -> Result<Value, GitLabError> {
            Ok(json!({"ok": true}))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool));
        registry.register(Arc::new(OkTool));
        registry
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let reply = handle_request(&registry(), request("initialize", json!({})))
            .await
            .unwrap();
        assert_eq!(reply["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(reply["result"]["serverInfo"]["name"], "labgate");
    }

    #[tokio::test]
    async fn test_tools_list_includes_schemas() {
        let reply = handle_request(&registry(), request("tools/list", json!({})))
            .await
            .unwrap();
        let tools = reply["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);

        let works = tools.iter().find(|t| t["name"] == "works").unwrap();
        assert_eq!(works["inputSchema"]["type"], "object");
        // Single optional parameter: no required key at all.
        assert!(works["inputSchema"].get("required").is_none());
    }

    #[tokio::test]
    async fn test_tool_failure_is_text_not_protocol_error() {
        let reply = handle_request(
            &registry(),
            request("tools/call", json!({"name": "always_fails", "arguments": {}})),
        )
        .await
        .unwrap();

        assert!(reply.get("error").is_none());
        assert_eq!(reply["result"]["isError"], true);
        let text = reply["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Error executing always_fails:"));
        assert!(text.contains("503"));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_text_error_too() {
        let reply = handle_request(
            &registry(),
            request("tools/call", json!({"name": "nope", "arguments": {}})),
        )
        .await
        .unwrap();
        assert_eq!(reply["result"]["isError"], true);
        let text = reply["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("not found"));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let reply = handle_request(&registry(), request("resources/list", json!({})))
            .await
            .unwrap();
        assert_eq!(reply["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_notification_gets_no_reply() {
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: json!({}),
        };
        assert!(handle_request(&registry(), notification).await.is_none());
    }
}
