pub mod chat;
pub mod export;
pub mod mcp;
pub mod tool;
pub mod usage;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the advisor a question, optionally continuing a saved session
    Chat(chat::ChatArgs),
    /// Generate a burn-rate report, business model canvas or pitch deck
    Tool(tool::ToolArgs),
    /// Show token usage and spend for today and overall
    Usage,
    /// Print a saved conversation session
    Export(export::ExportArgs),
    /// Start the MCP server (stdio transport)
    Mcp,
}
