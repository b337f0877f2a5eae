use std::sync::Arc;

use anyhow::Result;

use foundry_core::config::FoundryConfig;

use crate::bootstrap;

pub fn run(config: &FoundryConfig) -> Result<()> {
    let advisor = Arc::new(bootstrap::advisor(config)?);
    let rt = bootstrap::runtime()?;
    rt.block_on(async {
        foundry_mcp::run_stdio(advisor, config.call_options())
            .await
            .map_err(|e| anyhow::anyhow!("MCP server error: {e}"))
    })
}
