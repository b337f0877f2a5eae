use std::collections::BTreeMap;
use std::sync::Arc;

use foundry_core::capability::{CallOptions, GenerationService, Retriever};
use foundry_core::config::FoundryConfig;
use foundry_core::ledger::UsageLedger;
use foundry_core::model::{ConversationState, UsageSummary};

use crate::artifact::{ArtifactKind, GeneratedArtifact, StructuredArtifactGenerator, ToolRequest};
use crate::error::AdvisorError;
use crate::workflow::{EngineSettings, WorkflowEngine};

/// Everything the application surfaces need behind one handle: chat turns,
/// artifact generation and the usage ledger they both report to.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use foundry_advisor::Advisor;
/// # use foundry_core::capability::{CallOptions, GenerationService, Retriever};
/// # use foundry_core::ledger::{PriceTable, UsageLedger};
/// # use foundry_core::model::ConversationState;
/// # async fn demo(generation: Arc<dyn GenerationService>, retriever: Arc<dyn Retriever>) -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = Arc::new(UsageLedger::open("token_usage.json", PriceTable::default())?);
/// let advisor = Advisor::builder(generation, retriever, ledger)
///     .chat_model("gpt-4")
///     .tools_model("gpt-3.5-turbo")
///     .build();
/// let state = advisor
///     .chat(&ConversationState::new(), "How long should my runway be?", &CallOptions::new())
///     .await?;
/// println!("{}", state.latest_answer().unwrap_or_default());
/// # Ok(())
/// # }
/// ```
pub struct Advisor {
    engine: WorkflowEngine,
    generator: StructuredArtifactGenerator,
    ledger: Arc<UsageLedger>,
}

impl Advisor {
    pub fn builder(
        generation: Arc<dyn GenerationService>,
        retriever: Arc<dyn Retriever>,
        ledger: Arc<UsageLedger>,
    ) -> AdvisorBuilder {
        AdvisorBuilder {
            generation,
            retriever,
            ledger,
            engine: EngineSettings::default(),
            tools_model: "gpt-3.5-turbo".to_string(),
        }
    }

    /// Append `message` as a user turn and run it.
    pub async fn chat(
        &self,
        state: &ConversationState,
        message: &str,
        options: &CallOptions,
    ) -> Result<ConversationState, AdvisorError> {
        if message.trim().is_empty() {
            return Err(AdvisorError::InvalidInput("message is empty".into()));
        }
        self.engine.invoke(&state.with_user_message(message), options).await
    }

    /// Run a turn on a state whose last message is already the user's.
    pub async fn invoke(
        &self,
        state: &ConversationState,
        options: &CallOptions,
    ) -> Result<ConversationState, AdvisorError> {
        self.engine.invoke(state, options).await
    }

    pub async fn generate(
        &self,
        kind: ArtifactKind,
        inputs: &BTreeMap<String, String>,
        options: &CallOptions,
    ) -> Result<GeneratedArtifact, AdvisorError> {
        self.generator.generate_from_inputs(kind, inputs, options).await
    }

    pub async fn generate_request(
        &self,
        request: &ToolRequest,
        options: &CallOptions,
    ) -> Result<GeneratedArtifact, AdvisorError> {
        self.generator.generate(request, options).await
    }

    pub fn usage(&self) -> UsageSummary {
        self.ledger.summary()
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }
}

pub struct AdvisorBuilder {
    generation: Arc<dyn GenerationService>,
    retriever: Arc<dyn Retriever>,
    ledger: Arc<UsageLedger>,
    engine: EngineSettings,
    tools_model: String,
}

impl AdvisorBuilder {
    /// Take models, temperature and retrieval depth from `config`.
    pub fn config(mut self, config: &FoundryConfig) -> Self {
        self.engine = EngineSettings::from_config(config);
        self.tools_model = config.models.tools.clone();
        self
    }

    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.engine.model = model.into();
        self
    }

    pub fn tools_model(mut self, model: impl Into<String>) -> Self {
        self.tools_model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.engine.temperature = temperature;
        self
    }

    pub fn top_k(mut self, k: usize) -> Self {
        self.engine.top_k = k;
        self
    }

    pub fn build(self) -> Advisor {
        let engine = WorkflowEngine::new(self.generation.clone(), self.retriever, self.engine)
            .with_ledger(self.ledger.clone());
        let generator = StructuredArtifactGenerator::new(self.generation, self.tools_model)
            .with_ledger(self.ledger.clone());
        Advisor {
            engine,
            generator,
            ledger: self.ledger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRetriever, ScriptedGeneration};
    use foundry_core::ledger::PriceTable;
    use foundry_core::model::Document;
    use tempfile::TempDir;

    fn ledger(tmp: &TempDir) -> Arc<UsageLedger> {
        Arc::new(UsageLedger::open(tmp.path().join("usage.json"), PriceTable::default()).unwrap())
    }

    #[tokio::test]
    async fn test_chat_and_tools_share_ledger() {
        let tmp = TempDir::new().unwrap();
        let generation = Arc::new(ScriptedGeneration::replying(&["yes", "Answer.", "not json"]));
        let retriever = Arc::new(FakeRetriever::new(vec![Document::new("ctx", "a.pdf")]));
        let advisor = Advisor::builder(generation.clone(), retriever, ledger(&tmp))
            .top_k(1)
            .build();

        assert_eq!(advisor.usage().total_tokens, 0);
        let state = advisor
            .chat(&ConversationState::new(), "What is a term sheet?", &CallOptions::new())
            .await
            .unwrap();
        assert_eq!(state.context().len(), 1);

        let inputs: BTreeMap<String, String> = [
            ("capital".to_string(), "100000".to_string()),
            ("monthly_expenses".to_string(), "40000".to_string()),
        ]
        .into_iter()
        .collect();
        let artifact = advisor
            .generate(ArtifactKind::BurnRate, &inputs, &CallOptions::new())
            .await
            .unwrap();
        assert!(artifact.is_fallback());

        let record = advisor.ledger().record();
        assert!(record.model("gpt-4").tokens > 0);
        assert!(record.model("gpt-3.5-turbo").tokens > 0);
        assert_eq!(advisor.usage().total_tokens, record.total_tokens);
        assert_eq!(generation.requests()[2].model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_config_selects_models() {
        let tmp = TempDir::new().unwrap();
        let mut config = FoundryConfig::default();
        config.models.chat = "gpt-4o".into();
        config.models.tools = "gpt-4o-mini".into();
        let generation = Arc::new(ScriptedGeneration::replying(&["no", "Hello."]));
        let advisor = Advisor::builder(generation.clone(), Arc::new(FakeRetriever::new(vec![])), ledger(&tmp))
            .config(&config)
            .build();

        advisor
            .chat(&ConversationState::new(), "hi", &CallOptions::new())
            .await
            .unwrap();
        assert!(generation.requests().iter().all(|r| r.model == "gpt-4o"));
    }

    #[tokio::test]
    async fn test_blank_message_rejected() {
        let tmp = TempDir::new().unwrap();
        let generation = Arc::new(ScriptedGeneration::replying(&[]));
        let advisor = Advisor::builder(generation.clone(), Arc::new(FakeRetriever::new(vec![])), ledger(&tmp)).build();
        let err = advisor
            .chat(&ConversationState::new(), "   ", &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidInput(_)));
        assert!(generation.requests().is_empty());
    }
}
