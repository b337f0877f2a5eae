use foundry_core::model::{ConversationState, Document, Role, UsageSummary};

use super::OutputFormat;

pub fn format_sources(documents: &[Document]) -> String {
    let mut out = String::new();
    for (i, doc) in documents.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, doc.display_source()));
    }
    out
}

pub fn format_usage(summary: &UsageSummary, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(summary).unwrap_or_default(),
        OutputFormat::Text => format!(
            "Today:  {} tokens  ${:.4}\nTotal:  {} tokens  ${:.4}",
            summary.today_tokens, summary.today_cost, summary.total_tokens, summary.total_cost
        ),
        OutputFormat::Markdown => format!(
            "| | Tokens | Cost |\n|---|---:|---:|\n| Today | {} | ${:.4} |\n| Total | {} | ${:.4} |",
            summary.today_tokens, summary.today_cost, summary.total_tokens, summary.total_cost
        ),
    }
}

pub fn format_transcript(state: &ConversationState, fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => state.to_json().unwrap_or_default(),
        OutputFormat::Text => state
            .messages()
            .iter()
            .map(|m| format!("{}: {}", speaker(m.role), m.content))
            .collect::<Vec<_>>()
            .join("\n\n"),
        OutputFormat::Markdown => state
            .messages()
            .iter()
            .map(|m| format!("**{}:** {}", speaker(m.role), m.content))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Advisor",
    }
}
