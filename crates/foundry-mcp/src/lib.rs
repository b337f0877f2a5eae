use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    tool, tool_handler, tool_router, ServerHandler,
};
use schemars::JsonSchema;
use serde::Deserialize;

use foundry_advisor::artifact::runway::{self, DEFAULT_MONTHS};
use foundry_advisor::{Advisor, ArtifactKind, RunwayInputs};
use foundry_core::capability::{CallOptions, CancellationToken};
use foundry_core::model::{ConversationState, Message, Role};

/// MCP server exposing advisor chat, artifact generation and usage to agents.
///
/// Conversations are stateless on this side: hosts pass prior turns in
/// `history` and keep the returned answer themselves.
#[derive(Clone)]
pub struct FoundryMcpServer {
    advisor: Arc<Advisor>,
    options: CallOptions,
    tool_router: ToolRouter<Self>,
}

impl FoundryMcpServer {
    /// `options` supplies the timeout and retry policy for every tool call.
    pub fn new(advisor: Arc<Advisor>, options: CallOptions) -> Self {
        Self {
            advisor,
            options,
            tool_router: Self::tool_router(),
        }
    }

    fn call_options(&self) -> CallOptions {
        self.options.clone().with_cancel(CancellationToken::new())
    }
}

// -- Tool parameter structs --

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HistoryEntry {
    /// "user" or "assistant" ("human" and "ai" are accepted too)
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ChatParams {
    /// The user's question
    pub message: String,
    /// Earlier turns, oldest first
    pub history: Option<Vec<HistoryEntry>>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ArtifactParams {
    /// burn_rate, business_model_canvas or pitch_deck
    pub kind: String,
    /// burn_rate: capital, monthly_expenses. business_model_canvas: problem, solution,
    /// target_group. pitch_deck: the canvas fields plus optional business_model,
    /// market_size, funding_needed.
    pub inputs: BTreeMap<String, String>,
    /// "json" (default) or "markdown"
    pub format: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunwayParams {
    /// Cash on hand
    pub cash: f64,
    /// Monthly operating expenses
    pub monthly_expenses: f64,
    /// Monthly revenue (default 0)
    pub monthly_revenue: Option<f64>,
    /// Months to project (default 12, at most 120)
    pub months: Option<u32>,
    /// "json" (default) or "markdown"
    pub format: Option<String>,
}

fn parse_role(role: &str) -> Result<Role, String> {
    match role.trim().to_ascii_lowercase().as_str() {
        "user" | "human" => Ok(Role::User),
        "assistant" | "ai" => Ok(Role::Assistant),
        other => Err(format!("Unknown role '{other}' in history")),
    }
}

fn history_state(history: Option<Vec<HistoryEntry>>) -> Result<ConversationState, String> {
    let messages = history
        .unwrap_or_default()
        .into_iter()
        .map(|entry| {
            Ok(Message {
                role: parse_role(&entry.role)?,
                content: entry.content,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(ConversationState::from_messages(messages))
}

// -- Tool implementations --

#[tool_router]
impl FoundryMcpServer {
    #[tool(
        description = "Ask the startup advisor a question. Business questions are answered from the knowledge base and list their sources; anything else is answered directly."
    )]
    async fn advisor_chat(&self, Parameters(params): Parameters<ChatParams>) -> Result<String, String> {
        let state = history_state(params.history)?;
        let next = self
            .advisor
            .chat(&state, &params.message, &self.call_options())
            .await
            .map_err(|e| format!("Chat failed: {e}"))?;

        let mut out = next.latest_answer().unwrap_or_default().to_string();
        if next.is_relevant() && !next.context().is_empty() {
            out.push_str("\n\nSources:\n");
            for (i, doc) in next.context().iter().enumerate() {
                out.push_str(&format!("{}. {}\n", i + 1, doc.display_source()));
            }
        }
        Ok(out)
    }

    #[tool(
        description = "Generate a structured startup artifact (burn_rate, business_model_canvas or pitch_deck). Always returns a complete artifact; 'origin' says whether it came from the model or the built-in fallback."
    )]
    async fn generate_artifact(
        &self,
        Parameters(params): Parameters<ArtifactParams>,
    ) -> Result<String, String> {
        let kind: ArtifactKind = params.kind.parse()?;
        let artifact = self
            .advisor
            .generate(kind, &params.inputs, &self.call_options())
            .await
            .map_err(|e| format!("Generation failed: {e}"))?;

        match params.format.as_deref().unwrap_or("json") {
            "markdown" | "md" => Ok(artifact.to_markdown()),
            "json" => serde_json::to_string_pretty(&artifact)
                .map_err(|e| format!("Failed to serialize artifact: {e}")),
            other => Err(format!("Unknown format '{other}' (expected json or markdown)")),
        }
    }

    #[tool(
        description = "Project cash runway from cash, expenses and revenue: net burn, month-by-month balance, expense split and risk zone. Pure arithmetic, no model call."
    )]
    fn runway_projection(&self, Parameters(params): Parameters<RunwayParams>) -> Result<String, String> {
        let inputs = RunwayInputs::new(
            params.cash,
            params.monthly_expenses,
            params.monthly_revenue.unwrap_or(0.0),
        )
        .and_then(|inputs| inputs.with_months(params.months.unwrap_or(DEFAULT_MONTHS)))
        .map_err(|e| e.to_string())?;
        let report = runway::project_today(&inputs);

        match params.format.as_deref().unwrap_or("json") {
            "markdown" | "md" => Ok(report.to_markdown()),
            "json" => serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to serialize projection: {e}")),
            other => Err(format!("Unknown format '{other}' (expected json or markdown)")),
        }
    }

    #[tool(description = "Show token and cost totals for today and overall.")]
    fn usage_summary(&self) -> Result<String, String> {
        let summary = self.advisor.usage();
        Ok(format!(
            "Today: {} tokens, ${:.4}\nTotal: {} tokens, ${:.4}\n",
            summary.today_tokens, summary.today_cost, summary.total_tokens, summary.total_cost
        ))
    }
}

#[tool_handler]
impl ServerHandler for FoundryMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Foundry MCP Server - Startup advisor. Ask business questions, \
                 generate burn-rate reports, runway projections, business model canvases \
                 and pitch decks, and check token usage."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

/// Start the MCP server on stdio transport.
pub async fn run_stdio(
    advisor: Arc<Advisor>,
    options: CallOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    use rmcp::transport::stdio;
    use rmcp::ServiceExt;

    tracing::info!("Serving MCP tools on stdio");
    let server = FoundryMcpServer::new(advisor, options);
    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use async_trait::async_trait;
    use foundry_core::capability::{CapabilityError, CompletionRequest, GenerationService, Retriever};
    use foundry_core::ledger::{PriceTable, UsageLedger};
    use foundry_core::model::Document;
    use tempfile::TempDir;

    struct Canned(Mutex<Vec<&'static str>>);

    #[async_trait]
    impl GenerationService for Canned {
        async fn complete(
            &self,
            _request: &CompletionRequest,
            _options: &CallOptions,
        ) -> Result<String, CapabilityError> {
            let mut replies = self.0.lock().unwrap();
            if replies.is_empty() {
                return Err(CapabilityError::Transport("no reply".into()));
            }
            Ok(replies.remove(0).to_string())
        }
    }

    struct OneDoc;

    #[async_trait]
    impl Retriever for OneDoc {
        async fn top_k(
            &self,
            _query: &str,
            _k: usize,
            _options: &CallOptions,
        ) -> Result<Vec<Document>, CapabilityError> {
            Ok(vec![Document::new("Runway is cash over burn.", "https://www.example.com/a")])
        }
    }

    fn server(tmp: &TempDir, replies: Vec<&'static str>) -> FoundryMcpServer {
        let ledger = Arc::new(UsageLedger::open(tmp.path().join("usage.json"), PriceTable::default()).unwrap());
        let advisor = Advisor::builder(Arc::new(Canned(Mutex::new(replies))), Arc::new(OneDoc), ledger).build();
        FoundryMcpServer::new(Arc::new(advisor), CallOptions::new())
    }

    #[tokio::test]
    async fn test_chat_lists_sources_when_grounded() {
        let tmp = TempDir::new().unwrap();
        let server = server(&tmp, vec!["yes", "About 18 months."]);
        let out = server
            .advisor_chat(Parameters(ChatParams {
                message: "How much runway?".into(),
                history: Some(vec![
                    HistoryEntry { role: "human".into(), content: "Hi".into() },
                    HistoryEntry { role: "ai".into(), content: "Hello!".into() },
                ]),
            }))
            .await
            .unwrap();
        assert!(out.starts_with("About 18 months."));
        assert!(out.contains("Sources:\n1. example.com\n"));
    }

    #[tokio::test]
    async fn test_chat_rejects_unknown_role() {
        let tmp = TempDir::new().unwrap();
        let server = server(&tmp, vec![]);
        let err = server
            .advisor_chat(Parameters(ChatParams {
                message: "q".into(),
                history: Some(vec![HistoryEntry { role: "system".into(), content: "x".into() }]),
            }))
            .await
            .unwrap_err();
        assert!(err.contains("Unknown role"));
    }

    #[tokio::test]
    async fn test_generate_artifact_json_and_markdown() {
        let tmp = TempDir::new().unwrap();
        let server = server(&tmp, vec!["garbage", "garbage"]);
        let inputs: BTreeMap<String, String> = [
            ("capital".to_string(), "100000".to_string()),
            ("monthly_expenses".to_string(), "10000".to_string()),
        ]
        .into_iter()
        .collect();

        let json = server
            .generate_artifact(Parameters(ArtifactParams {
                kind: "burn_rate".into(),
                inputs: inputs.clone(),
                format: None,
            }))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["origin"], "fallback");
        assert_eq!(value["value"]["runway_months"], serde_json::json!(10.0));
        assert_eq!(value["value"]["warning_level"], "healthy");

        let md = server
            .generate_artifact(Parameters(ArtifactParams {
                kind: "burn_rate".into(),
                inputs,
                format: Some("markdown".into()),
            }))
            .await
            .unwrap();
        assert!(md.starts_with("# Burn Rate Report"));

        let usage = server.usage_summary().unwrap();
        assert!(usage.starts_with("Today: "));
        assert!(!usage.contains("Total: 0 tokens"));
    }

    #[tokio::test]
    async fn test_unknown_kind() {
        let tmp = TempDir::new().unwrap();
        let server = server(&tmp, vec![]);
        let err = server
            .generate_artifact(Parameters(ArtifactParams {
                kind: "spreadsheet".into(),
                inputs: BTreeMap::new(),
                format: None,
            }))
            .await
            .unwrap_err();
        assert!(err.contains("unknown artifact kind"));
    }

    #[test]
    fn test_runway_projection_without_model() {
        let tmp = TempDir::new().unwrap();
        let server = server(&tmp, vec![]);
        let json = server
            .runway_projection(Parameters(RunwayParams {
                cash: 100_000.0,
                monthly_expenses: 40_000.0,
                monthly_revenue: Some(15_000.0),
                months: Some(6),
                format: None,
            }))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["runway_months"], serde_json::json!(4.0));
        assert_eq!(value["risk_zone"], "caution");
        assert_eq!(value["projection"].as_array().unwrap().len(), 7);
        assert!(server.usage_summary().unwrap().contains("Total: 0 tokens"));

        let err = server
            .runway_projection(Parameters(RunwayParams {
                cash: -1.0,
                monthly_expenses: 1.0,
                monthly_revenue: None,
                months: None,
                format: None,
            }))
            .unwrap_err();
        assert!(err.contains("cash must be a non-negative number"));
    }
}
