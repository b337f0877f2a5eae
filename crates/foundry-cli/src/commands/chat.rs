use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use foundry_core::config::FoundryConfig;
use foundry_core::model::ConversationState;

use crate::bootstrap;
use crate::output::format::format_sources;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ChatArgs {
    /// Question for the advisor
    pub message: String,

    /// Session file to continue and update (created if missing)
    #[arg(long)]
    pub session: Option<PathBuf>,
}

pub fn run(args: &ChatArgs, config: &FoundryConfig, format: OutputFormat) -> Result<()> {
    if args.message.trim().is_empty() {
        bail!("Message must not be empty");
    }
    let state = match &args.session {
        Some(path) => load_session(path)?,
        None => ConversationState::new(),
    };

    let advisor = bootstrap::advisor(config)?;
    let rt = bootstrap::runtime()?;
    let next = rt.block_on(async {
        let options = bootstrap::interruptible(config);
        advisor.chat(&state, &args.message, &options).await
    });
    let next = next.context("Advisor turn failed")?;

    if let Some(path) = &args.session {
        let json = next.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write session {}", path.display()))?;
    }

    let answer = next.latest_answer().unwrap_or_default();
    match format {
        OutputFormat::Json => {
            let sources: Vec<String> = next.context().iter().map(|d| d.display_source()).collect();
            let out = serde_json::json!({
                "session_id": next.session_id().as_str(),
                "answer": answer,
                "is_relevant": next.is_relevant(),
                "sources": sources,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            println!("{answer}");
            if next.is_relevant() && !next.context().is_empty() {
                println!("\nSources:");
                print!("{}", format_sources(next.context()));
            }
        }
    }

    Ok(())
}

fn load_session(path: &Path) -> Result<ConversationState> {
    if !path.exists() {
        return Ok(ConversationState::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read session {}", path.display()))?;
    ConversationState::from_json(&json)
        .with_context(|| format!("Failed to parse session {}", path.display()))
}

pub(crate) fn read_session(path: &Path) -> Result<ConversationState> {
    if !path.exists() {
        bail!("Session file not found: {}", path.display());
    }
    load_session(path)
}
