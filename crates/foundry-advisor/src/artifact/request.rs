use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::ArtifactKind;
use crate::error::AdvisorError;

/// Problem, solution and target group shared by the canvas and the pitch deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VentureBrief {
    pub problem: String,
    pub solution: String,
    pub target_group: String,
}

impl VentureBrief {
    pub fn new(
        problem: impl Into<String>,
        solution: impl Into<String>,
        target_group: impl Into<String>,
    ) -> Result<Self, AdvisorError> {
        Ok(Self {
            problem: required_text("problem", problem.into())?,
            solution: required_text("solution", solution.into())?,
            target_group: required_text("target_group", target_group.into())?,
        })
    }
}

/// Optional pitch-deck inputs. Blank values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchExtras {
    pub business_model: Option<String>,
    pub market_size: Option<String>,
    pub funding_needed: Option<String>,
}

impl PitchExtras {
    pub fn new(
        business_model: Option<String>,
        market_size: Option<String>,
        funding_needed: Option<String>,
    ) -> Self {
        Self {
            business_model: optional_text(business_model),
            market_size: optional_text(market_size),
            funding_needed: optional_text(funding_needed),
        }
    }
}

/// Validated inputs for one artifact.
///
/// Only the checked constructors build one, so bad input never reaches a
/// model call or a fallback and never costs tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest(ToolInput);

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ToolInput {
    BurnRate { capital: f64, monthly_expenses: f64 },
    BusinessModelCanvas(VentureBrief),
    PitchDeck { brief: VentureBrief, extras: PitchExtras },
}

impl ToolRequest {
    pub fn burn_rate(capital: f64, monthly_expenses: f64) -> Result<Self, AdvisorError> {
        if !capital.is_finite() || capital < 0.0 {
            return Err(AdvisorError::InvalidInput(
                "capital must be a non-negative number".into(),
            ));
        }
        if !monthly_expenses.is_finite() || monthly_expenses <= 0.0 {
            return Err(AdvisorError::InvalidInput(
                "monthly_expenses must be greater than zero".into(),
            ));
        }
        Ok(Self(ToolInput::BurnRate {
            capital,
            monthly_expenses,
        }))
    }

    pub fn canvas(brief: VentureBrief) -> Self {
        Self(ToolInput::BusinessModelCanvas(brief))
    }

    pub fn pitch_deck(brief: VentureBrief, extras: PitchExtras) -> Self {
        Self(ToolInput::PitchDeck { brief, extras })
    }

    /// Interpret a free-form `field -> text` mapping for `kind`.
    pub fn from_inputs(
        kind: ArtifactKind,
        inputs: &BTreeMap<String, String>,
    ) -> Result<Self, AdvisorError> {
        let text = |name: &str| inputs.get(name).cloned().unwrap_or_default();
        match kind {
            ArtifactKind::BurnRate => {
                let capital = parse_amount("capital", inputs.get("capital"))?;
                let expenses = parse_amount("monthly_expenses", inputs.get("monthly_expenses"))?;
                Self::burn_rate(capital, expenses)
            }
            ArtifactKind::BusinessModelCanvas => Ok(Self::canvas(VentureBrief::new(
                text("problem"),
                text("solution"),
                text("target_group"),
            )?)),
            ArtifactKind::PitchDeck => Ok(Self::pitch_deck(
                VentureBrief::new(text("problem"), text("solution"), text("target_group"))?,
                PitchExtras::new(
                    inputs.get("business_model").cloned(),
                    inputs.get("market_size").cloned(),
                    inputs.get("funding_needed").cloned(),
                ),
            )),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match &self.0 {
            ToolInput::BurnRate { .. } => ArtifactKind::BurnRate,
            ToolInput::BusinessModelCanvas(_) => ArtifactKind::BusinessModelCanvas,
            ToolInput::PitchDeck { .. } => ArtifactKind::PitchDeck,
        }
    }

    pub(crate) fn input(&self) -> &ToolInput {
        &self.0
    }

    #[cfg(test)]
    pub(crate) fn unchecked(input: ToolInput) -> Self {
        Self(input)
    }
}

fn required_text(name: &str, value: String) -> Result<String, AdvisorError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AdvisorError::InvalidInput(format!("{name} is required")));
    }
    Ok(trimmed.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts plain numbers plus the usual currency decoration (`$100,000`).
pub(crate) fn parse_amount(name: &str, raw: Option<&String>) -> Result<f64, AdvisorError> {
    let raw = raw.map(|s| s.trim()).unwrap_or_default();
    if raw.is_empty() {
        return Err(AdvisorError::InvalidInput(format!("{name} is required")));
    }
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '_' | ' '))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AdvisorError::InvalidInput(format!("{name} must be a number, got '{raw}'")))
}
