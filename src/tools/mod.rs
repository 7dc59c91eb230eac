//! Tool System - schema-described GitLab operations exposed to agents
//!
//! Every tool declares its contract as an ordered parameter table; the
//! protocol-visible JSON schema is derived from that table (see
//! [`schema`]), and whether a parameter is required is inferred from its
//! description: a parameter is optional exactly when its description
//! contains the word "optional" (any letter case). A parameter with no
//! description at all is required — an ambiguous contract is treated as
//! mandatory.

pub mod branches;
pub mod issues;
pub mod merge_requests;
pub mod pipelines;
pub mod projects;
pub mod registry;
pub mod repository;
pub mod schema;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::gitlab::GitLabError;

/// JSON-schema type of a single parameter. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    Array,
    Object,
    Number,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Number => "number",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter's declarative contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn new(name: &str, param_type: ParamType, description: &str) -> Self {
        Self {
            name: name.to_string(),
            param_type,
            description: Some(description.to_string()),
        }
    }

    /// Required unless the description says "optional". No description
    /// means required.
    pub fn is_required(&self) -> bool {
        match &self.description {
            Some(d) => !d.to_lowercase().contains("optional"),
            None => true,
        }
    }
}

/// A tool's declared contract: name, description and ordered parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
}

impl fmt::Display for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.description)
    }
}

/// One callable capability.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The declared contract (name, description, parameter table).
    fn definition(&self) -> ToolDefinition;

    /// Execute against the remote API. Failures surface as [`GitLabError`].
    async fn execute(&self, args: Value) -> Result<Value, GitLabError>;
}

/// Pull a required string argument, rejecting absent or empty values
/// before any remote call is attempted.
pub(crate) fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, GitLabError> {
    let value = args
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| GitLabError::Validation(format!("'{name}' is required")))?;
    if value.trim().is_empty() {
        return Err(GitLabError::Validation(format!(
            "'{name}' must not be empty"
        )));
    }
    Ok(value)
}

/// Pull a required integer argument.
pub(crate) fn required_u64(args: &Value, name: &str) -> Result<u64, GitLabError> {
    args.get(name)
        .and_then(Value::as_u64)
        .ok_or_else(|| GitLabError::Validation(format!("'{name}' is required")))
}

/// Pull an optional string argument; absent and null are equivalent.
pub(crate) fn optional_str<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str)
}
