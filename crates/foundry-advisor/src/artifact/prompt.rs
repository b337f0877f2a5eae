use super::request::{PitchExtras, ToolInput, ToolRequest, VentureBrief};

const NOT_SPECIFIED: &str = "Not specified";

/// Full prompt for `request`, ending with the JSON shape the reply must take.
pub fn render(request: &ToolRequest) -> String {
    let kind = request.kind();
    let shape = serde_json::to_string_pretty(&kind.schema().describe()).unwrap_or_default();
    let body = match request.input() {
        ToolInput::BurnRate {
            capital,
            monthly_expenses,
        } => burn_rate_task(*capital, *monthly_expenses),
        ToolInput::BusinessModelCanvas(brief) => canvas_task(brief),
        ToolInput::PitchDeck { brief, extras } => pitch_deck_task(brief, extras),
    };
    format!(
        "{body}\n\nReturn only a JSON object with the following structure:\n{shape}\n\n\
         Include every required field. Do not add commentary outside the JSON."
    )
}

fn burn_rate_task(capital: f64, monthly_expenses: f64) -> String {
    format!(
        "Calculate the burn rate and runway for a startup with:\n\
         - Capital: {}\n\
         - Monthly Expenses: {}\n\n\
         Consider:\n\
         - Runway is capital divided by monthly expenses\n\
         - Warning levels: critical below 3 months, warning from 3 to 6 months, healthy above 6 months\n\
         - Give a recommendation that fits the warning level",
        currency(capital),
        currency(monthly_expenses)
    )
}

fn brief_section(brief: &VentureBrief) -> String {
    format!(
        "Problem Statement:\n{}\n\nSolution:\n{}\n\nTarget Group:\n{}",
        brief.problem, brief.solution, brief.target_group
    )
}

fn canvas_task(brief: &VentureBrief) -> String {
    format!(
        "You are a business model expert. Generate a detailed Business Model Canvas \
         for a startup with the following information:\n\n{}\n\n\
         Instructions:\n\
         1. Give specific, actionable items for each section\n\
         2. Each section should have 3-5 detailed points\n\
         3. Focus on practical, implementable aspects\n\
         4. Keep all sections logically connected",
        brief_section(brief)
    )
}

fn pitch_deck_task(brief: &VentureBrief, extras: &PitchExtras) -> String {
    let or_unspecified = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_SPECIFIED.to_string());
    format!(
        "You are a pitch deck expert. Generate a comprehensive pitch deck outline \
         for a startup with the following information:\n\n{}\n\n\
         Additional Information:\n\
         Business Model: {}\n\
         Market Size: {}\n\
         Funding Needed: {}\n\n\
         Instructions:\n\
         1. Outline 9 slides with specific content on each\n\
         2. Create a memorable company name and tagline\n\
         3. Include specific market data and trends\n\
         4. End with clear, actionable next steps",
        brief_section(brief),
        or_unspecified(&extras.business_model),
        or_unspecified(&extras.market_size),
        or_unspecified(&extras.funding_needed),
    )
}

/// `$1,234,567.89`
pub fn currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
