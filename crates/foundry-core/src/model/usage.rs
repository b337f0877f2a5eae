use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Tokens and cost accumulated in one bucket (a day or a model).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageBucket {
    pub tokens: u64,
    pub cost: f64,
}

impl UsageBucket {
    fn add(&mut self, tokens: u64, cost: f64) {
        self.tokens += tokens;
        self.cost += cost;
    }
}

/// The persisted ledger document. The file on disk is exactly this shape.
///
/// `total_tokens` and `total_cost` always equal the sums over `daily_usage`
/// (and over `model_usage`), and only ever grow.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageRecord {
    pub total_tokens: u64,
    pub total_cost: f64,
    #[serde(default)]
    pub daily_usage: BTreeMap<String, UsageBucket>,
    #[serde(default)]
    pub model_usage: BTreeMap<String, UsageBucket>,
}

impl UsageRecord {
    /// Add one call's usage to the grand total, the date bucket and the model bucket.
    pub fn apply(&mut self, date: &str, model: &str, tokens: u64, cost: f64) {
        self.total_tokens += tokens;
        self.total_cost += cost;
        self.daily_usage
            .entry(date.to_string())
            .or_default()
            .add(tokens, cost);
        self.model_usage
            .entry(model.to_string())
            .or_default()
            .add(tokens, cost);
    }

    pub fn day(&self, date: &str) -> UsageBucket {
        self.daily_usage.get(date).copied().unwrap_or_default()
    }

    pub fn model(&self, model: &str) -> UsageBucket {
        self.model_usage.get(model).copied().unwrap_or_default()
    }

    pub fn summary(&self, today: &str) -> UsageSummary {
        let day = self.day(today);
        UsageSummary {
            today_tokens: day.tokens,
            today_cost: day.cost,
            total_tokens: self.total_tokens,
            total_cost: self.total_cost,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct UsageSummary {
    pub today_tokens: u64,
    pub today_cost: f64,
    pub total_tokens: u64,
    pub total_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_updates_all_aggregates() {
        let mut record = UsageRecord::default();
        record.apply("2026-10-19", "gpt-4", 120, 0.5);
        record.apply("2026-10-19", "gpt-3.5-turbo", 30, 0.25);
        record.apply("2026-10-20", "gpt-4", 50, 0.25);

        assert_eq!(record.total_tokens, 200);
        assert!((record.total_cost - 1.0).abs() < 1e-12);
        assert_eq!(record.day("2026-10-19").tokens, 150);
        assert_eq!(record.day("2026-10-20").tokens, 50);
        assert_eq!(record.model("gpt-4").tokens, 170);
        assert_eq!(record.model("gpt-3.5-turbo").tokens, 30);

        let daily_sum: u64 = record.daily_usage.values().map(|b| b.tokens).sum();
        let model_sum: u64 = record.model_usage.values().map(|b| b.tokens).sum();
        assert_eq!(daily_sum, record.total_tokens);
        assert_eq!(model_sum, record.total_tokens);
    }

    #[test]
    fn test_summary_for_missing_day_is_zero() {
        let mut record = UsageRecord::default();
        record.apply("2026-10-18", "gpt-4", 10, 0.1);
        let summary = record.summary("2026-10-19");
        assert_eq!(summary.today_tokens, 0);
        assert_eq!(summary.today_cost, 0.0);
        assert_eq!(summary.total_tokens, 10);
    }

    #[test]
    fn test_reads_legacy_file_shape() {
        let json = r#"{
            "total_tokens": 42,
            "total_cost": 0.0001,
            "daily_usage": {"2025-03-01": {"tokens": 42, "cost": 0.0001}},
            "model_usage": {"gpt-4": {"tokens": 42, "cost": 0.0001}}
        }"#;
        let record: UsageRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.total_tokens, 42);
        assert_eq!(record.day("2025-03-01").tokens, 42);
        assert_eq!(record.model("gpt-4").tokens, 42);
    }
}
