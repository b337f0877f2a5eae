//! Wires configured backends into the advisor for each command.

use std::sync::Arc;

use anyhow::{Context, Result};

use foundry_advisor::{Advisor, StructuredArtifactGenerator};
use foundry_core::capability::{CallOptions, GenerationService, Retriever};
use foundry_core::config::FoundryConfig;
use foundry_core::ledger::UsageLedger;
use foundry_llm::OpenAiBackend;
use foundry_retrieval::KnowledgeRetriever;

pub fn ledger(config: &FoundryConfig) -> Result<Arc<UsageLedger>> {
    let path = config.ledger_path();
    let ledger = UsageLedger::open(&path, config.pricing_table())
        .with_context(|| format!("Failed to open usage ledger at {}", path.display()))?;
    Ok(Arc::new(ledger))
}

pub fn generation(config: &FoundryConfig) -> Result<Arc<dyn GenerationService>> {
    let backend = OpenAiBackend::from_config(config).context("Generation backend unavailable")?;
    Ok(Arc::new(backend))
}

pub fn retriever(config: &FoundryConfig) -> Result<Arc<dyn Retriever>> {
    let path = config.index_path();
    let retriever = KnowledgeRetriever::open(&path).with_context(|| {
        format!(
            "Failed to open knowledge index at {} (set [retrieval] index_path)",
            path.display()
        )
    })?;
    Ok(Arc::new(retriever))
}

pub fn advisor(config: &FoundryConfig) -> Result<Advisor> {
    let generation = generation(config)?;
    let retriever = retriever(config)?;
    let ledger = ledger(config)?;
    Ok(Advisor::builder(generation, retriever, ledger)
        .config(config)
        .build())
}

pub fn generator(config: &FoundryConfig) -> Result<StructuredArtifactGenerator> {
    let generation = generation(config)?;
    let ledger = ledger(config)?;
    Ok(StructuredArtifactGenerator::new(generation, config.models.tools.clone()).with_ledger(ledger))
}

pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Failed to create async runtime")
}

/// Call options from config whose token fires on Ctrl-C. Must be called
/// inside the runtime.
pub fn interruptible(config: &FoundryConfig) -> CallOptions {
    let options = config.call_options();
    let cancel = options.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling in-flight call");
            cancel.cancel();
        }
    });
    options
}
