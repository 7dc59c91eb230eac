//! labgate - GitLab exposed as MCP tools
//!
//! An MCP (Model Context Protocol) server that presents a GitLab instance
//! as a set of schema-described tools an automated agent can list and
//! call: projects, issues, merge requests, branches, pipelines and
//! repository content. Destructive tools carry confirmation metadata so a
//! calling agent can put a human in the loop before executing them.

pub mod cli;
pub mod config;
pub mod elicitation;
pub mod gitlab;
pub mod server;
pub mod tools;
pub mod utils;

pub use config::Settings;
pub use elicitation::{ElicitationConfig, ElicitationRegistry, ElicitationRequest, Severity};
pub use gitlab::{GitLabClient, GitLabError};
pub use tools::registry::ToolRegistry;
pub use tools::{ParamSpec, ParamType, Tool, ToolDefinition};
