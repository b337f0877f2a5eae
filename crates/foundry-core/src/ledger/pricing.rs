use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// USD per 1,000 tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ModelRates {
    pub input: f64,
    pub output: f64,
}

impl ModelRates {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }
}

/// Per-model rates used to price tracked calls. Models without an entry cost nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PriceTable {
    rates: BTreeMap<String, ModelRates>,
}

impl PriceTable {
    pub fn empty() -> Self {
        Self {
            rates: BTreeMap::new(),
        }
    }

    pub fn with_rates(mut self, model: impl Into<String>, rates: ModelRates) -> Self {
        self.rates.insert(model.into(), rates);
        self
    }

    /// Add or replace every entry of `overrides`.
    pub fn merge(&mut self, overrides: &BTreeMap<String, ModelRates>) {
        for (model, rates) in overrides {
            self.rates.insert(model.clone(), *rates);
        }
    }

    pub fn rates(&self, model: &str) -> Option<ModelRates> {
        self.rates.get(model).copied()
    }

    pub fn cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        match self.rates(model) {
            Some(r) => {
                (input_tokens as f64 / 1000.0) * r.input
                    + (output_tokens as f64 / 1000.0) * r.output
            }
            None => 0.0,
        }
    }
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::empty()
            .with_rates("gpt-3.5-turbo", ModelRates::new(0.0015, 0.002))
            .with_rates("gpt-4", ModelRates::new(0.03, 0.06))
            .with_rates("gpt-4o", ModelRates::new(0.0025, 0.01))
            .with_rates("gpt-4o-mini", ModelRates::new(0.00015, 0.0006))
    }
}
