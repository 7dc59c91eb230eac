use anyhow::Result;
use clap::Parser;
use labgate::cli::{Cli, Commands};
use labgate::elicitation::{ElicitationRegistry, Severity};
use labgate::tools::registry::ToolRegistry;
use labgate::tools::schema;
use labgate::{utils, GitLabClient, Settings};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::new()?;

    // Logs go to stderr: in serve mode stdout carries the JSON-RPC stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let token = Settings::token()?;
    let client = Arc::new(GitLabClient::new(settings.gitlab.url.clone(), token));
    let registry = ToolRegistry::with_gitlab_tools(client);

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve => labgate::server::run(registry).await,
        Commands::Tools => handle_tools(&registry),
        Commands::Call { name, args, yes } => handle_call(&registry, &name, &args, yes).await,
    }
}

fn handle_tools(registry: &ToolRegistry) -> Result<()> {
    utils::print_header("Registered tools");

    for def in registry.definitions() {
        utils::print_success(&format!("{}", def));
        if ElicitationRegistry::requires_confirmation(&def.name) {
            utils::print_warning("  requires confirmation");
        }
        let schema = schema::input_schema(&def.parameters);
        println!("{}", serde_json::to_string_pretty(&schema)?);
    }
    Ok(())
}

async fn handle_call(registry: &ToolRegistry, name: &str, args: &str, yes: bool) -> Result<()> {
    let args: Value = serde_json::from_str(args)
        .map_err(|e| anyhow::anyhow!("--args must be a JSON object: {e}"))?;
    let arg_map = args
        .as_object()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("--args must be a JSON object"))?;

    if !yes {
        if let Some(request) = ElicitationRegistry::create_request(name, arg_map) {
            match request.severity {
                Severity::Warning => utils::print_warning(&request.message),
                Severity::Info => utils::print_info(&request.message),
            }
            utils::print_prompt("Proceed? [y/N] ");

            let mut input = String::new();
            let mut reader = BufReader::new(tokio::io::stdin());
            reader.read_line(&mut input).await?;
            if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
                utils::print_info("Aborted.");
                return Ok(());
            }
        }
    }

    match registry.call(name, args).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(err) => {
            utils::print_error(&format!("Error executing {name}: {err}"));
            std::process::exit(1);
        }
    }
}
