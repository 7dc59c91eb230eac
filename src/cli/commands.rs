use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "labgate")]
#[command(author, version, about = "GitLab tools over MCP", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the tool set over stdio (MCP JSON-RPC)
    Serve,

    /// List registered tools with their derived input schemas
    Tools,

    /// Call one tool directly from the terminal
    Call {
        /// Tool name, e.g. get_project
        name: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,

        /// Skip the confirmation prompt for destructive tools
        #[arg(short = 'y', long)]
        yes: bool,
    },
}
