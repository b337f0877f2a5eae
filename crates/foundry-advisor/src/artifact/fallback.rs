//! Deterministic artifacts used whenever a model reply fails validation.

use serde::{Deserialize, Serialize};

use super::request::{PitchExtras, VentureBrief};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    Critical,
    Warning,
    Healthy,
}

impl WarningLevel {
    pub fn for_runway(months: f64) -> Self {
        if months < 3.0 {
            WarningLevel::Critical
        } else if months < 6.0 {
            WarningLevel::Warning
        } else {
            WarningLevel::Healthy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BurnRateReport {
    pub runway_months: f64,
    pub burn_rate: f64,
    pub warning_level: WarningLevel,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessModelCanvas {
    pub key_partners: Vec<String>,
    pub key_activities: Vec<String>,
    pub key_resources: Vec<String>,
    pub value_proposition: Vec<String>,
    pub customer_relationships: Vec<String>,
    pub channels: Vec<String>,
    pub customer_segments: Vec<String>,
    pub cost_structure: Vec<String>,
    pub revenue_streams: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchDeck {
    pub title_slide: TitleSlide,
    pub problem_slide: ProblemSlide,
    pub solution_slide: SolutionSlide,
    pub market_slide: MarketSlide,
    pub business_model_slide: BusinessModelSlide,
    pub go_to_market_slide: GoToMarketSlide,
    pub team_slide: TeamSlide,
    pub financials_slide: FinancialsSlide,
    pub call_to_action: CallToAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleSlide {
    pub company_name: String,
    pub tagline: String,
    pub logo_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemSlide {
    pub main_problem: String,
    pub key_pain_points: Vec<String>,
    pub current_solutions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionSlide {
    pub main_solution: String,
    pub key_features: Vec<String>,
    pub unique_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSlide {
    pub target_market: String,
    pub market_size: String,
    pub growth_potential: String,
    pub market_trends: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessModelSlide {
    pub revenue_model: String,
    pub key_metrics: Vec<String>,
    pub cost_structure: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoToMarketSlide {
    pub strategy: String,
    pub channels: Vec<String>,
    pub timeline: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSlide {
    pub key_roles: Vec<String>,
    pub team_strengths: Vec<String>,
    pub hiring_plan: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialsSlide {
    pub funding_needed: String,
    pub use_of_funds: Vec<String>,
    pub financial_projections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToAction {
    pub next_steps: Vec<String>,
    pub contact_info: String,
    pub investment_terms: String,
}

const RECALCULATE: &str = "Please recalculate with valid inputs.";

/// Runway is capital over monthly expenses, rounded to one decimal with ties
/// going to the even digit. `monthly_expenses` must be positive.
pub fn burn_rate(capital: f64, monthly_expenses: f64) -> BurnRateReport {
    let runway_months = round_tenths(capital / monthly_expenses);
    BurnRateReport {
        runway_months,
        burn_rate: monthly_expenses,
        warning_level: WarningLevel::for_runway(runway_months),
        recommendation: RECALCULATE.to_string(),
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round_ties_even() / 10.0
}

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn business_model_canvas(brief: &VentureBrief) -> BusinessModelCanvas {
    BusinessModelCanvas {
        key_partners: lines(&[
            "Technology partners for core solution components",
            "Distribution and implementation partners",
            "Maintenance and support service providers",
        ]),
        key_activities: lines(&[
            "Research and development of the core solution",
            "Onboarding and setup for new customers",
            "Ongoing maintenance and support",
            "Customer training and education",
        ]),
        key_resources: lines(&[
            "Technical expertise and IP",
            "Supply chain and delivery capacity",
            "Customer support team",
        ]),
        value_proposition: vec![
            brief.solution.clone(),
            "Reliable and affordable answer to the core problem".to_string(),
            "Easy to adopt and maintain".to_string(),
            "Comprehensive support and training".to_string(),
        ],
        customer_relationships: lines(&[
            "Personal assistance and support",
            "Training and education programs",
            "Community building and knowledge sharing",
        ]),
        channels: lines(&[
            "Direct sales team",
            "Partner network",
            "Online platform",
        ]),
        customer_segments: vec![
            brief.target_group.clone(),
            "Secondary markets with similar needs".to_string(),
            "Early adopters and innovators".to_string(),
        ],
        cost_structure: lines(&[
            "Research and development costs",
            "Production and delivery",
            "Sales and marketing expenses",
            "Customer support and maintenance",
        ]),
        revenue_streams: lines(&[
            "Product sales and licensing",
            "Subscription and service fees",
            "Support contracts",
            "Training and consulting services",
        ]),
    }
}

/// The first two words of the solution, each capitalized, run together.
pub fn company_name(solution: &str) -> String {
    solution.split_whitespace().take(2).map(capitalize).collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn tagline(problem: &str) -> String {
    let head: String = problem.chars().take(50).collect();
    format!("Solving {head}...")
}

pub fn pitch_deck(brief: &VentureBrief, extras: &PitchExtras) -> PitchDeck {
    PitchDeck {
        title_slide: TitleSlide {
            company_name: company_name(&brief.solution),
            tagline: tagline(&brief.problem),
            logo_description: "A modern, minimalist logo representing the solution".to_string(),
        },
        problem_slide: ProblemSlide {
            main_problem: brief.problem.clone(),
            key_pain_points: lines(&[
                "Current solutions are too expensive",
                "Existing options lack reliability",
                "Adoption requires complex infrastructure",
            ]),
            current_solutions: lines(&[
                "Incumbent providers",
                "Manual workarounds",
                "Expensive custom solutions",
            ]),
        },
        solution_slide: SolutionSlide {
            main_solution: brief.solution.clone(),
            key_features: lines(&[
                "Easy onboarding",
                "Simple management interface",
                "Reliable operation",
            ]),
            unique_value: format!("An affordable, reliable answer for {}", brief.target_group),
        },
        market_slide: MarketSlide {
            target_market: brief.target_group.clone(),
            market_size: extras
                .market_size
                .clone()
                .unwrap_or_else(|| "Growing addressable market".to_string()),
            growth_potential: "High growth potential as adoption increases".to_string(),
            market_trends: lines(&[
                "Increasing digital transformation",
                "Growing demand for affordable solutions",
                "Shift toward subscription services",
            ]),
        },
        business_model_slide: BusinessModelSlide {
            revenue_model: extras
                .business_model
                .clone()
                .unwrap_or_else(|| "Product sales + subscription service".to_string()),
            key_metrics: lines(&[
                "Number of active customers",
                "Monthly recurring revenue",
                "Customer retention rate",
            ]),
            cost_structure: lines(&[
                "Product development",
                "Customer support",
                "Marketing and sales",
            ]),
        },
        go_to_market_slide: GoToMarketSlide {
            strategy: "Direct sales + partner network".to_string(),
            channels: lines(&[
                "Industry associations",
                "Technology partners",
                "Direct sales team",
                "Online platform",
            ]),
            timeline: lines(&[
                "Q1: Initial market entry",
                "Q2: Partner network expansion",
                "Q3: Scale operations",
                "Q4: Market leadership",
            ]),
        },
        team_slide: TeamSlide {
            key_roles: lines(&["CEO/Founder", "CTO", "Operations Director", "Sales Manager"]),
            team_strengths: lines(&[
                "Technical expertise",
                "Market knowledge",
                "Industry experience",
            ]),
            hiring_plan: lines(&[
                "Sales team expansion",
                "Technical support staff",
                "Operations team",
            ]),
        },
        financials_slide: FinancialsSlide {
            funding_needed: extras
                .funding_needed
                .clone()
                .unwrap_or_else(|| "$2M Series A".to_string()),
            use_of_funds: lines(&[
                "Product development",
                "Market expansion",
                "Team growth",
                "Operations scaling",
            ]),
            financial_projections: lines(&[
                "Year 1: $1M revenue",
                "Year 2: $5M revenue",
                "Year 3: $15M revenue",
            ]),
        },
        call_to_action: CallToAction {
            next_steps: lines(&[
                "Schedule a detailed presentation",
                "Review financial projections",
                "Discuss partnership opportunities",
            ]),
            contact_info: "contact@company.com".to_string(),
            investment_terms: "Series A: $2M for 20% equity".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief() -> VentureBrief {
        VentureBrief {
            problem: "Small shops in rural areas cannot get affordable, reliable internet access for payments".into(),
            solution: "solar-powered MESH routers for village markets".into(),
            target_group: "Rural small businesses".into(),
        }
    }

    #[test]
    fn test_burn_rate_critical() {
        let report = burn_rate(100_000.0, 40_000.0);
        assert_eq!(report.runway_months, 2.5);
        assert_eq!(report.warning_level, WarningLevel::Critical);
        assert_eq!(report.burn_rate, 40_000.0);
        assert_eq!(report.recommendation, "Please recalculate with valid inputs.");
    }

    #[test]
    fn test_burn_rate_healthy() {
        let report = burn_rate(100_000.0, 10_000.0);
        assert_eq!(report.runway_months, 10.0);
        assert_eq!(report.warning_level, WarningLevel::Healthy);
    }

    #[test]
    fn test_runway_ties_round_to_even() {
        assert_eq!(burn_rate(1.0, 4.0).runway_months, 0.2);
        assert_eq!(burn_rate(3.0, 4.0).runway_months, 0.8);
        assert_eq!(burn_rate(100_000.0, 30_000.0).runway_months, 3.3);
    }

    #[test]
    fn test_warning_thresholds() {
        assert_eq!(WarningLevel::for_runway(2.9), WarningLevel::Critical);
        assert_eq!(WarningLevel::for_runway(3.0), WarningLevel::Warning);
        assert_eq!(WarningLevel::for_runway(5.9), WarningLevel::Warning);
        assert_eq!(WarningLevel::for_runway(6.0), WarningLevel::Healthy);
        assert_eq!(burn_rate(10_000.0, 3_000.0).runway_months, 3.3);
    }

    #[test]
    fn test_company_name_from_solution() {
        assert_eq!(company_name("solar-powered MESH routers"), "Solar-poweredMesh");
        assert_eq!(company_name("Ledger"), "Ledger");
    }

    #[test]
    fn test_pitch_deck_interpolates_inputs() {
        let deck = pitch_deck(&brief(), &PitchExtras::default());
        assert_eq!(deck.title_slide.company_name, "Solar-poweredMesh");
        assert_eq!(
            deck.title_slide.tagline,
            "Solving Small shops in rural areas cannot get affordable, ..."
        );
        assert_eq!(deck.problem_slide.main_problem, brief().problem);
        assert_eq!(deck.market_slide.target_market, "Rural small businesses");
        assert_eq!(deck.financials_slide.funding_needed, "$2M Series A");

        let extras = PitchExtras {
            business_model: Some("Hardware + SaaS".into()),
            market_size: Some("$4B".into()),
            funding_needed: Some("$500k pre-seed".into()),
        };
        let deck = pitch_deck(&brief(), &extras);
        assert_eq!(deck.business_model_slide.revenue_model, "Hardware + SaaS");
        assert_eq!(deck.market_slide.market_size, "$4B");
        assert_eq!(deck.financials_slide.funding_needed, "$500k pre-seed");
    }

    #[test]
    fn test_canvas_mentions_target_group() {
        let canvas = business_model_canvas(&brief());
        assert_eq!(canvas.customer_segments[0], "Rural small businesses");
        assert_eq!(canvas.value_proposition[0], brief().solution);
    }
}
