use anyhow::Result;

use foundry_core::config::FoundryConfig;

use crate::bootstrap;
use crate::output::format::format_usage;
use crate::output::OutputFormat;

pub fn run(config: &FoundryConfig, format: OutputFormat) -> Result<()> {
    let ledger = bootstrap::ledger(config)?;
    let summary = ledger.summary();
    println!("{}", format_usage(&summary, format));
    Ok(())
}
