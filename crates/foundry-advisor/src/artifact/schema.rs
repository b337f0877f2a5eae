use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Shape of one field in an artifact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Any JSON number; normalized to a float.
    Number,
    /// A string, optionally restricted to a fixed set of values.
    Text { one_of: &'static [&'static str] },
    /// An array of strings with at least `min_items` entries.
    TextList { min_items: usize },
    Object(&'static [FieldSpec]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, title: &'static str, description: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            title,
            description,
            kind,
            required: true,
        }
    }

    const fn number(name: &'static str, title: &'static str, description: &'static str) -> Self {
        Self::new(name, title, description, FieldKind::Number)
    }

    const fn text(name: &'static str, title: &'static str, description: &'static str) -> Self {
        Self::new(name, title, description, FieldKind::Text { one_of: &[] })
    }

    const fn list(name: &'static str, title: &'static str, description: &'static str, min_items: usize) -> Self {
        Self::new(name, title, description, FieldKind::TextList { min_items })
    }

    const fn object(name: &'static str, title: &'static str, fields: &'static [FieldSpec]) -> Self {
        Self::new(name, title, "", FieldKind::Object(fields))
    }
}

/// Declarative contract a generated artifact must satisfy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtifactSchema {
    pub kind: ArtifactKind,
    pub fields: &'static [FieldSpec],
}

impl ArtifactSchema {
    /// JSON-schema style `properties` object embedded in prompts.
    pub fn describe(&self) -> Value {
        describe_fields(self.fields)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

fn describe_fields(fields: &[FieldSpec]) -> Value {
    let mut properties = Map::new();
    for field in fields {
        let mut entry = match field.kind {
            FieldKind::Number => json!({"type": "number"}),
            FieldKind::Text { one_of } if !one_of.is_empty() => {
                json!({"type": "string", "enum": one_of})
            }
            FieldKind::Text { .. } => json!({"type": "string"}),
            FieldKind::TextList { min_items } => {
                let mut list = json!({"type": "array", "items": {"type": "string"}});
                if min_items > 0 {
                    list["minItems"] = json!(min_items);
                }
                list
            }
            FieldKind::Object(children) => {
                let required: Vec<&str> = children
                    .iter()
                    .filter(|c| c.required)
                    .map(|c| c.name)
                    .collect();
                json!({
                    "type": "object",
                    "properties": describe_fields(children),
                    "required": required,
                })
            }
        };
        if !field.description.is_empty() {
            entry["description"] = json!(field.description);
        }
        properties.insert(field.name.to_string(), entry);
    }
    Value::Object(properties)
}

/// The three artifacts the tool surface can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    BurnRate,
    BusinessModelCanvas,
    PitchDeck,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::BurnRate,
        ArtifactKind::BusinessModelCanvas,
        ArtifactKind::PitchDeck,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::BurnRate => "burn_rate",
            ArtifactKind::BusinessModelCanvas => "business_model_canvas",
            ArtifactKind::PitchDeck => "pitch_deck",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ArtifactKind::BurnRate => "Burn Rate Report",
            ArtifactKind::BusinessModelCanvas => "Business Model Canvas",
            ArtifactKind::PitchDeck => "Pitch Deck Outline",
        }
    }

    pub fn schema(&self) -> ArtifactSchema {
        let fields = match self {
            ArtifactKind::BurnRate => BURN_RATE_FIELDS,
            ArtifactKind::BusinessModelCanvas => CANVAS_FIELDS,
            ArtifactKind::PitchDeck => PITCH_DECK_FIELDS,
        };
        ArtifactSchema { kind: *self, fields }
    }

    /// The numeric task runs cold; the two writing tasks get room to vary.
    pub fn temperature(&self) -> f32 {
        match self {
            ArtifactKind::BurnRate => 0.0,
            ArtifactKind::BusinessModelCanvas | ArtifactKind::PitchDeck => 0.7,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "burn_rate" => Ok(ArtifactKind::BurnRate),
            "business_model_canvas" | "canvas" => Ok(ArtifactKind::BusinessModelCanvas),
            "pitch_deck" => Ok(ArtifactKind::PitchDeck),
            other => Err(format!(
                "unknown artifact kind '{other}' (expected burn_rate, business_model_canvas or pitch_deck)"
            )),
        }
    }
}

pub const WARNING_LEVELS: &[&str] = &["critical", "warning", "healthy"];

const BURN_RATE_FIELDS: &[FieldSpec] = &[
    FieldSpec::number(
        "runway_months",
        "Runway (months)",
        "Number of months the startup can operate with current capital",
    ),
    FieldSpec::number("burn_rate", "Monthly Burn Rate", "Monthly burn rate in currency units"),
    FieldSpec::new(
        "warning_level",
        "Warning Level",
        "Warning level based on runway",
        FieldKind::Text {
            one_of: WARNING_LEVELS,
        },
    ),
    FieldSpec::text(
        "recommendation",
        "Recommendation",
        "Recommendation based on the calculation",
    ),
];

const CANVAS_MIN_ITEMS: usize = 2;

const CANVAS_FIELDS: &[FieldSpec] = &[
    FieldSpec::list(
        "key_partners",
        "Key Partners",
        "Key partners and suppliers needed to make the business model work",
        CANVAS_MIN_ITEMS,
    ),
    FieldSpec::list(
        "key_activities",
        "Key Activities",
        "Key activities needed to create and deliver the value proposition",
        CANVAS_MIN_ITEMS,
    ),
    FieldSpec::list(
        "key_resources",
        "Key Resources",
        "Key resources needed to create and deliver the value proposition",
        CANVAS_MIN_ITEMS,
    ),
    FieldSpec::list(
        "value_proposition",
        "Value Proposition",
        "Products and services that create value for the target group",
        CANVAS_MIN_ITEMS,
    ),
    FieldSpec::list(
        "customer_relationships",
        "Customer Relationships",
        "Types of relationships established with customers",
        CANVAS_MIN_ITEMS,
    ),
    FieldSpec::list(
        "channels",
        "Channels",
        "How the value proposition is delivered to customers",
        CANVAS_MIN_ITEMS,
    ),
    FieldSpec::list(
        "customer_segments",
        "Customer Segments",
        "Different groups of customers the business aims to reach",
        CANVAS_MIN_ITEMS,
    ),
    FieldSpec::list(
        "cost_structure",
        "Cost Structure",
        "Main costs incurred to operate the business model",
        CANVAS_MIN_ITEMS,
    ),
    FieldSpec::list(
        "revenue_streams",
        "Revenue Streams",
        "Ways the business generates revenue",
        CANVAS_MIN_ITEMS,
    ),
];

const TITLE_SLIDE: &[FieldSpec] = &[
    FieldSpec::text("company_name", "Company Name", ""),
    FieldSpec::text("tagline", "Tagline", ""),
    FieldSpec::text("logo_description", "Logo", ""),
];

const PROBLEM_SLIDE: &[FieldSpec] = &[
    FieldSpec::text("main_problem", "Main Problem", ""),
    FieldSpec::list("key_pain_points", "Key Pain Points", "", 0),
    FieldSpec::list("current_solutions", "Current Solutions", "", 0),
];

const SOLUTION_SLIDE: &[FieldSpec] = &[
    FieldSpec::text("main_solution", "Main Solution", ""),
    FieldSpec::list("key_features", "Key Features", "", 0),
    FieldSpec::text("unique_value", "Unique Value", ""),
];

const MARKET_SLIDE: &[FieldSpec] = &[
    FieldSpec::text("target_market", "Target Market", ""),
    FieldSpec::text("market_size", "Market Size", ""),
    FieldSpec::text("growth_potential", "Growth Potential", ""),
    FieldSpec::list("market_trends", "Market Trends", "", 0),
];

const BUSINESS_MODEL_SLIDE: &[FieldSpec] = &[
    FieldSpec::text("revenue_model", "Revenue Model", ""),
    FieldSpec::list("key_metrics", "Key Metrics", "", 0),
    FieldSpec::list("cost_structure", "Cost Structure", "", 0),
];

const GO_TO_MARKET_SLIDE: &[FieldSpec] = &[
    FieldSpec::text("strategy", "Strategy", ""),
    FieldSpec::list("channels", "Channels", "", 0),
    FieldSpec::list("timeline", "Timeline", "", 0),
];

const TEAM_SLIDE: &[FieldSpec] = &[
    FieldSpec::list("key_roles", "Key Roles", "", 0),
    FieldSpec::list("team_strengths", "Team Strengths", "", 0),
    FieldSpec::list("hiring_plan", "Hiring Plan", "", 0),
];

const FINANCIALS_SLIDE: &[FieldSpec] = &[
    FieldSpec::text("funding_needed", "Funding Needed", ""),
    FieldSpec::list("use_of_funds", "Use of Funds", "", 0),
    FieldSpec::list("financial_projections", "Financial Projections", "", 0),
];

const CALL_TO_ACTION: &[FieldSpec] = &[
    FieldSpec::list("next_steps", "Next Steps", "", 0),
    FieldSpec::text("contact_info", "Contact", ""),
    FieldSpec::text("investment_terms", "Investment Terms", ""),
];

const PITCH_DECK_FIELDS: &[FieldSpec] = &[
    FieldSpec::object("title_slide", "Title", TITLE_SLIDE),
    FieldSpec::object("problem_slide", "Problem", PROBLEM_SLIDE),
    FieldSpec::object("solution_slide", "Solution", SOLUTION_SLIDE),
    FieldSpec::object("market_slide", "Market Opportunity", MARKET_SLIDE),
    FieldSpec::object("business_model_slide", "Business Model", BUSINESS_MODEL_SLIDE),
    FieldSpec::object("go_to_market_slide", "Go-to-Market Strategy", GO_TO_MARKET_SLIDE),
    FieldSpec::object("team_slide", "Team", TEAM_SLIDE),
    FieldSpec::object("financials_slide", "Financials", FINANCIALS_SLIDE),
    FieldSpec::object("call_to_action", "Call to Action", CALL_TO_ACTION),
];
