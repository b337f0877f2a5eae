use std::fmt;
use std::sync::Arc;

use foundry_core::capability::{self, CallOptions, CompletionRequest, GenerationService, Retriever};
use foundry_core::config::FoundryConfig;
use foundry_core::ledger::UsageLedger;
use foundry_core::model::{context_block, ConversationState, Document, Message};

use crate::classifier::QueryClassifier;
use crate::error::AdvisorError;
use crate::tracking;

/// Model, temperature and retrieval depth for chat turns.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub model: String,
    pub temperature: f32,
    pub top_k: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.2,
            top_k: 3,
        }
    }
}

impl EngineSettings {
    pub fn from_config(config: &FoundryConfig) -> Self {
        Self {
            model: config.models.chat.clone(),
            temperature: config.workflow.temperature,
            top_k: config.workflow.top_k,
        }
    }
}

/// Steps of a chat turn, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Classify,
    Retrieve,
    Skip,
    Generate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Classify => "classify",
            Stage::Retrieve => "retrieve",
            Stage::Skip => "skip",
            Stage::Generate => "generate",
        })
    }
}

pub fn grounded_prompt(context: &str, question: &str) -> String {
    format!(
        "Context: {context}\n\n\
         Question: {question}\n\n\
         Please provide a helpful response based on the context above."
    )
}

pub fn ungrounded_prompt(question: &str) -> String {
    format!("You are a helpful AI assistant. Please answer the following question:\n\n{question}")
}

/// Runs one chat turn: classify, retrieve when relevant, generate.
///
/// `invoke` takes the caller's state by reference and returns a new one, so a
/// failed stage leaves the caller holding exactly what it had before.
pub struct WorkflowEngine {
    classifier: QueryClassifier,
    generation: Arc<dyn GenerationService>,
    retriever: Arc<dyn Retriever>,
    ledger: Option<Arc<UsageLedger>>,
    settings: EngineSettings,
}

impl WorkflowEngine {
    pub fn new(
        generation: Arc<dyn GenerationService>,
        retriever: Arc<dyn Retriever>,
        settings: EngineSettings,
    ) -> Self {
        let classifier = QueryClassifier::new(generation.clone(), settings.model.clone())
            .with_temperature(settings.temperature);
        Self {
            classifier,
            generation,
            retriever,
            ledger: None,
            settings,
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<UsageLedger>) -> Self {
        self.classifier = self.classifier.with_ledger(ledger.clone());
        self.ledger = Some(ledger);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn invoke(
        &self,
        state: &ConversationState,
        options: &CallOptions,
    ) -> Result<ConversationState, AdvisorError> {
        let question = state.latest_user_message().ok_or(AdvisorError::NoUserMessage)?;
        let session = state.session_id();

        tracing::debug!(%session, stage = %Stage::Classify, "Turn stage");
        let relevant = self.classifier.classify(question, options).await?;

        let context: Vec<Document> = if relevant {
            tracing::debug!(%session, stage = %Stage::Retrieve, k = self.settings.top_k, "Turn stage");
            capability::retrieve(self.retriever.as_ref(), question, self.settings.top_k, options)
                .await
                .map_err(AdvisorError::Retrieval)?
        } else {
            tracing::debug!(%session, stage = %Stage::Skip, "Turn stage");
            Vec::new()
        };

        tracing::debug!(%session, stage = %Stage::Generate, grounded = relevant, "Turn stage");
        let prompt = if relevant {
            grounded_prompt(&context_block(&context), question)
        } else {
            ungrounded_prompt(question)
        };
        let request = CompletionRequest::new(prompt, self.settings.temperature, self.settings.model.clone());
        let answer = capability::complete(self.generation.as_ref(), &request, options)
            .await
            .map_err(AdvisorError::Generation)?;
        tracking::record(self.ledger.as_deref(), &self.settings.model, &request.prompt, &answer)?;

        tracing::info!(
            %session,
            relevant,
            documents = context.len(),
            "Turn complete"
        );
        Ok(state.advance(Message::assistant(answer), context, relevant))
    }
}
