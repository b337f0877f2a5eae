use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use foundry_core::capability::{self, CallOptions, CompletionRequest, GenerationService};
use foundry_core::ledger::UsageLedger;

use super::fallback;
use super::prompt;
use super::request::{ToolInput, ToolRequest};
use super::schema::ArtifactKind;
use super::validate::{self, ValidationFailure};
use crate::error::AdvisorError;
use crate::tracking;

/// Where an artifact's content came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum Origin {
    Model,
    Fallback { reason: String },
}

/// An artifact that satisfies its kind's schema, whatever its origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub kind: ArtifactKind,
    #[serde(flatten)]
    pub origin: Origin,
    pub value: Value,
}

impl GeneratedArtifact {
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback { .. })
    }

    pub fn to_markdown(&self) -> String {
        super::render::markdown(self)
    }
}

/// Turns tool requests into schema-conformant artifacts.
///
/// The model is asked once. Its reply is parsed and validated against the
/// schema for the requested kind; on any failure the reply is discarded
/// whole and the deterministic fallback for that request is returned instead.
pub struct StructuredArtifactGenerator {
    generation: Arc<dyn GenerationService>,
    model: String,
    ledger: Option<Arc<UsageLedger>>,
}

impl StructuredArtifactGenerator {
    pub fn new(generation: Arc<dyn GenerationService>, model: impl Into<String>) -> Self {
        Self {
            generation,
            model: model.into(),
            ledger: None,
        }
    }

    pub fn with_ledger(mut self, ledger: Arc<UsageLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Parse `inputs` for `kind`, then [`generate`](Self::generate).
    pub async fn generate_from_inputs(
        &self,
        kind: ArtifactKind,
        inputs: &BTreeMap<String, String>,
        options: &CallOptions,
    ) -> Result<GeneratedArtifact, AdvisorError> {
        let request = ToolRequest::from_inputs(kind, inputs)?;
        self.generate(&request, options).await
    }

    pub async fn generate(
        &self,
        request: &ToolRequest,
        options: &CallOptions,
    ) -> Result<GeneratedArtifact, AdvisorError> {
        let kind = request.kind();
        let prompt = prompt::render(request);
        let completion = CompletionRequest::new(prompt, kind.temperature(), self.model.clone());

        tracing::debug!(%kind, model = %self.model, "Generating artifact");
        let reply = capability::complete(self.generation.as_ref(), &completion, options)
            .await
            .map_err(AdvisorError::Generation)?;
        tracking::record(self.ledger.as_deref(), &self.model, &completion.prompt, &reply)?;

        let artifact = match accept(kind, &reply) {
            Ok(value) => GeneratedArtifact {
                kind,
                origin: Origin::Model,
                value,
            },
            Err(failure) => {
                tracing::warn!(%kind, reason = %failure, "Discarding model output, using fallback");
                tracing::debug!(%kind, raw = %reply, "Rejected model output");
                fallback_artifact(request, failure)?
            }
        };
        tracing::info!(%kind, fallback = artifact.is_fallback(), "Artifact ready");
        Ok(artifact)
    }
}

fn accept(kind: ArtifactKind, reply: &str) -> Result<Value, ValidationFailure> {
    let parsed = validate::parse_reply(reply)?;
    validate::validate(&kind.schema(), parsed)
}

/// Deterministic substitute for `request`, checked against the same schema as
/// model output before it is handed out.
fn fallback_artifact(
    request: &ToolRequest,
    failure: ValidationFailure,
) -> Result<GeneratedArtifact, AdvisorError> {
    let kind = request.kind();
    let value = match request.input() {
        ToolInput::BurnRate {
            capital,
            monthly_expenses,
        } => serde_json::to_value(fallback::burn_rate(*capital, *monthly_expenses)),
        ToolInput::BusinessModelCanvas(brief) => {
            serde_json::to_value(fallback::business_model_canvas(brief))
        }
        ToolInput::PitchDeck { brief, extras } => {
            serde_json::to_value(fallback::pitch_deck(brief, extras))
        }
    }
    .map_err(|e| AdvisorError::InvalidInput(format!("cannot build {kind} fallback: {e}")))?;

    let value = validate::validate(&kind.schema(), value).map_err(|e| {
        AdvisorError::InvalidInput(format!("{kind} fallback does not fit its schema: {e}"))
    })?;

    Ok(GeneratedArtifact {
        kind,
        origin: Origin::Fallback {
            reason: failure.to_string(),
        },
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::request::{PitchExtras, VentureBrief};
    use crate::artifact::schema::{FieldKind, FieldSpec};
    use crate::testing::ScriptedGeneration;
    use foundry_core::capability::CapabilityError;
    use foundry_core::ledger::PriceTable;
    use serde_json::json;
    use tempfile::TempDir;

    fn scripted(replies: Vec<Result<String, CapabilityError>>) -> (Arc<ScriptedGeneration>, StructuredArtifactGenerator) {
        let service = Arc::new(ScriptedGeneration::new(replies));
        let generator = StructuredArtifactGenerator::new(service.clone(), "gpt-3.5-turbo");
        (service, generator)
    }

    fn brief() -> VentureBrief {
        VentureBrief::new(
            "Freelancers chase late invoices by hand",
            "automatic invoice reminders",
            "Freelance designers",
        )
        .unwrap()
    }

    /// A value that fills every field of `fields` with something acceptable.
    fn complete_value(fields: &[FieldSpec]) -> Value {
        let mut value = json!({});
        for field in fields {
            value[field.name] = match field.kind {
                FieldKind::Number => json!(1.5),
                FieldKind::Text { one_of } => match one_of.first() {
                    Some(allowed) => json!(allowed),
                    None => json!(format!("{} text", field.name)),
                },
                FieldKind::TextList { .. } => {
                    json!([format!("{} one", field.name), format!("{} two", field.name)])
                }
                FieldKind::Object(inner) => complete_value(inner),
            };
        }
        value
    }

    fn valid_canvas() -> Value {
        let mut value = json!({});
        for field in ArtifactKind::BusinessModelCanvas.schema().fields {
            value[field.name] = json!([format!("{} one", field.name), format!("{} two", field.name)]);
        }
        value
    }

    #[tokio::test]
    async fn test_valid_reply_returned_with_float_numbers() {
        let reply = r#"{"runway_months": 10, "burn_rate": 10000, "warning_level": "healthy", "recommendation": "Plan the next raise."}"#;
        let (service, generator) = scripted(vec![Ok(reply.to_string())]);

        let request = ToolRequest::burn_rate(100_000.0, 10_000.0).unwrap();
        let artifact = generator.generate(&request, &CallOptions::new()).await.unwrap();

        assert_eq!(artifact.origin, Origin::Model);
        assert_eq!(
            artifact.value,
            json!({"runway_months": 10.0, "burn_rate": 10000.0, "warning_level": "healthy", "recommendation": "Plan the next raise."})
        );
        let sent = service.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].temperature, 0.0);
        assert_eq!(sent[0].model, "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_wrapped_and_fenced_canvas_accepted() {
        let reply = format!("```json\n{}\n```", json!({"result": valid_canvas()}));
        let (service, generator) = scripted(vec![Ok(reply)]);

        let artifact = generator
            .generate(&ToolRequest::canvas(brief()), &CallOptions::new())
            .await
            .unwrap();
        assert!(!artifact.is_fallback());
        assert_eq!(artifact.value, valid_canvas());
        assert_eq!(service.requests()[0].temperature, 0.7);
    }

    #[tokio::test]
    async fn test_valid_pitch_deck_returned_unchanged() {
        let deck = complete_value(ArtifactKind::PitchDeck.schema().fields);
        assert_eq!(deck["financials_slide"]["use_of_funds"][1], "use_of_funds two");
        let (_, generator) = scripted(vec![Ok(deck.to_string())]);

        let request = ToolRequest::pitch_deck(brief(), PitchExtras::default());
        let artifact = generator.generate(&request, &CallOptions::new()).await.unwrap();

        assert_eq!(artifact.origin, Origin::Model);
        assert_eq!(artifact.value, deck);
    }

    #[tokio::test]
    async fn test_fallback_that_breaks_schema_is_not_returned() {
        let (_, generator) = scripted(vec![Ok("not json".into())]);
        let request = ToolRequest::unchecked(ToolInput::BurnRate {
            capital: 100_000.0,
            monthly_expenses: 0.0,
        });

        let err = generator.generate(&request, &CallOptions::new()).await.unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidInput(m) if m.contains("runway_months")));
    }

    #[tokio::test]
    async fn test_prose_reply_yields_burn_rate_fallback() {
        let (_, generator) = scripted(vec![Ok("Your runway is about 2.5 months.".into())]);
        let request = ToolRequest::burn_rate(100_000.0, 40_000.0).unwrap();
        let artifact = generator.generate(&request, &CallOptions::new()).await.unwrap();

        assert!(artifact.is_fallback());
        assert_eq!(artifact.value["runway_months"], json!(2.5));
        assert_eq!(artifact.value["warning_level"], "critical");
        assert_eq!(artifact.value["burn_rate"], json!(40000.0));
        assert!(validate::validate(&ArtifactKind::BurnRate.schema(), artifact.value).is_ok());
    }

    #[tokio::test]
    async fn test_partial_reply_is_discarded_whole() {
        let mut partial = valid_canvas();
        partial["channels"] = json!(["only one"]);
        let (_, generator) = scripted(vec![Ok(partial.to_string())]);

        let artifact = generator
            .generate(&ToolRequest::canvas(brief()), &CallOptions::new())
            .await
            .unwrap();
        assert!(matches!(artifact.origin, Origin::Fallback { ref reason } if reason.contains("channels")));
        // Nothing from the rejected reply survives
        assert_ne!(artifact.value["key_partners"], partial["key_partners"]);
        assert_eq!(artifact.value["customer_segments"][0], "Freelance designers");
    }

    #[tokio::test]
    async fn test_malformed_replies_always_conform() {
        let replies = [
            "",
            "null",
            "[]",
            r#"{"title_slide": {}}"#,
            r#"{"result": "nope"}"#,
            "```json\n{broken\n```",
        ];
        for reply in replies {
            let (_, generator) = scripted(vec![Ok(reply.to_string())]);
            let request = ToolRequest::pitch_deck(brief(), PitchExtras::default());
            let artifact = generator.generate(&request, &CallOptions::new()).await.unwrap();
            assert!(artifact.is_fallback(), "accepted {reply:?}");
            assert!(
                validate::validate(&ArtifactKind::PitchDeck.schema(), artifact.value.clone()).is_ok(),
                "fallback for {reply:?} does not conform"
            );
            assert_eq!(artifact.value["title_slide"]["company_name"], "AutomaticInvoice");
        }
    }

    #[tokio::test]
    async fn test_every_fallback_conforms() {
        let requests = [
            ToolRequest::burn_rate(0.0, 1.0).unwrap(),
            ToolRequest::canvas(brief()),
            ToolRequest::pitch_deck(
                brief(),
                PitchExtras::new(Some("SaaS".into()), Some("$1B".into()), Some("$250k".into())),
            ),
        ];
        for request in &requests {
            let artifact = fallback_artifact(request, ValidationFailure::NotAnObject).unwrap();
            assert!(validate::validate(&request.kind().schema(), artifact.value).is_ok());
        }
    }

    #[tokio::test]
    async fn test_generation_failure_is_surfaced() {
        let (_, generator) = scripted(vec![Err(CapabilityError::Provider {
            status: 500,
            message: "boom".into(),
        })]);
        let err = generator
            .generate(&ToolRequest::canvas(brief()), &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::Generation(_)));
    }

    #[tokio::test]
    async fn test_invalid_inputs_never_reach_model() {
        let (service, generator) = scripted(vec![]);
        let inputs: BTreeMap<String, String> =
            [("capital".to_string(), "lots".to_string())].into_iter().collect();
        let err = generator
            .generate_from_inputs(ArtifactKind::BurnRate, &inputs, &CallOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::InvalidInput(_)));
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn test_usage_tracked_under_tools_model() {
        let tmp = TempDir::new().unwrap();
        let ledger = Arc::new(UsageLedger::open(tmp.path().join("usage.json"), PriceTable::default()).unwrap());
        let (_, generator) = scripted(vec![Ok("not json".into())]);
        let generator = generator.with_ledger(ledger.clone());

        generator
            .generate(&ToolRequest::burn_rate(1.0, 1.0).unwrap(), &CallOptions::new())
            .await
            .unwrap();
        let record = ledger.record();
        assert!(record.total_tokens > 0);
        assert_eq!(record.model("gpt-3.5-turbo").tokens, record.total_tokens);
    }
}
