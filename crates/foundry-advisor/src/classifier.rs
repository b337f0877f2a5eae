use std::sync::Arc;

use foundry_core::capability::{self, CallOptions, CompletionRequest, GenerationService};
use foundry_core::ledger::UsageLedger;

use crate::error::AdvisorError;
use crate::tracking;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// `true` only for a reply that is exactly "yes" once trimmed and lower-cased.
pub fn is_affirmative(reply: &str) -> bool {
    reply.trim().to_lowercase() == "yes"
}

pub fn classification_prompt(query: &str) -> String {
    format!(
        "Given the following question, determine if it's related to startups, business, \
         entrepreneurship, or general business advice.\n\
         Answer with only 'yes' or 'no'.\n\n\
         Question: {query}\n\n\
         Is this question related to startups, business, or entrepreneurship?"
    )
}

/// Single-call relevance gate in front of retrieval.
pub struct QueryClassifier {
    generation: Arc<dyn GenerationService>,
    model: String,
    temperature: f32,
    ledger: Option<Arc<UsageLedger>>,
}

impl QueryClassifier {
    pub fn new(generation: Arc<dyn GenerationService>, model: impl Into<String>) -> Self {
        Self {
            generation,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            ledger: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<UsageLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Whether `query` is about startups or business. Never retried beyond the
    /// configured policy; a failed call fails the classification.
    pub async fn classify(&self, query: &str, options: &CallOptions) -> Result<bool, AdvisorError> {
        let request = CompletionRequest::new(classification_prompt(query), self.temperature, self.model.clone());
        let reply = capability::complete(self.generation.as_ref(), &request, options)
            .await
            .map_err(AdvisorError::Classification)?;
        tracking::record(self.ledger.as_deref(), &self.model, &request.prompt, &reply)?;

        let relevant = is_affirmative(&reply);
        tracing::debug!(relevant, reply = %reply.trim(), "Classified query");
        Ok(relevant)
    }
}
