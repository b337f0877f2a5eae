use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::output::format::format_transcript;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct ExportArgs {
    /// Session file written by `foundry chat --session`
    #[arg(long)]
    pub session: PathBuf,
}

pub fn run(args: &ExportArgs, format: OutputFormat) -> Result<()> {
    let state = super::chat::read_session(&args.session)?;
    if state.messages().is_empty() && !matches!(format, OutputFormat::Json) {
        println!("Session is empty.");
        return Ok(());
    }
    println!("{}", format_transcript(&state, format));
    Ok(())
}
