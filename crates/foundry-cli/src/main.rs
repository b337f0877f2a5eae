use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use foundry_core::config::FoundryConfig;

mod bootstrap;
mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "foundry",
    version,
    about = "Startup advisor: grounded answers, business artifacts and token accounting"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Config file (default: <config dir>/foundry/config.toml)
    #[arg(long, global = true, env = "FOUNDRY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = FoundryConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match &cli.command {
        commands::Commands::Chat(args) => commands::chat::run(args, &config, cli.format),
        commands::Commands::Tool(args) => commands::tool::run(args, &config, cli.format),
        commands::Commands::Usage => commands::usage::run(&config, cli.format),
        commands::Commands::Export(args) => commands::export::run(args, cli.format),
        commands::Commands::Mcp => commands::mcp::run(&config),
    }
}
