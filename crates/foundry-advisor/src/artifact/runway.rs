//! Cash runway projection: net burn after revenue, a month-by-month balance
//! forecast, a typical expense split and a risk zone. Pure arithmetic, no
//! model call.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::prompt::currency;
use super::request::parse_amount;
use crate::error::AdvisorError;

pub const DEFAULT_MONTHS: u32 = 12;
pub const MAX_MONTHS: u32 = 120;

/// Projection steps are fixed 30-day months.
const DAYS_PER_MONTH: u64 = 30;

const EXPENSE_SHARES: &[(&str, f64)] = &[
    ("Salaries", 0.60),
    ("Infrastructure", 0.15),
    ("Marketing", 0.10),
    ("Operations", 0.10),
    ("Other", 0.05),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskZone {
    Safe,
    Caution,
    Danger,
}

impl RiskZone {
    /// `None` means revenue covers expenses and the cash never runs out.
    pub fn for_runway(runway_months: Option<f64>) -> Self {
        match runway_months {
            None => RiskZone::Safe,
            Some(months) if months >= 6.0 => RiskZone::Safe,
            Some(months) if months >= 3.0 => RiskZone::Caution,
            Some(_) => RiskZone::Danger,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskZone::Safe => "Safe Zone",
            RiskZone::Caution => "Caution Zone",
            RiskZone::Danger => "Danger Zone",
        }
    }
}

impl fmt::Display for RiskZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Checked inputs for [`project`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunwayInputs {
    cash: f64,
    monthly_expenses: f64,
    monthly_revenue: f64,
    months: u32,
}

impl RunwayInputs {
    pub fn new(cash: f64, monthly_expenses: f64, monthly_revenue: f64) -> Result<Self, AdvisorError> {
        for (name, value) in [
            ("cash", cash),
            ("monthly_expenses", monthly_expenses),
            ("monthly_revenue", monthly_revenue),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AdvisorError::InvalidInput(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        Ok(Self {
            cash,
            monthly_expenses,
            monthly_revenue,
            months: DEFAULT_MONTHS,
        })
    }

    pub fn with_months(mut self, months: u32) -> Result<Self, AdvisorError> {
        if months == 0 || months > MAX_MONTHS {
            return Err(AdvisorError::InvalidInput(format!(
                "months must be between 1 and {MAX_MONTHS}"
            )));
        }
        self.months = months;
        Ok(self)
    }

    /// Read `cash`, `monthly_expenses` and optional `monthly_revenue` and
    /// `months` from a free-form mapping. Missing revenue counts as zero.
    pub fn from_inputs(inputs: &BTreeMap<String, String>) -> Result<Self, AdvisorError> {
        let cash = parse_amount("cash", inputs.get("cash"))?;
        let expenses = parse_amount("monthly_expenses", inputs.get("monthly_expenses"))?;
        let revenue = match inputs.get("monthly_revenue") {
            Some(raw) if !raw.trim().is_empty() => parse_amount("monthly_revenue", Some(raw))?,
            _ => 0.0,
        };
        let parsed = Self::new(cash, expenses, revenue)?;
        match inputs.get("months").map(|m| m.trim()).filter(|m| !m.is_empty()) {
            Some(raw) => {
                let months = raw.parse::<u32>().map_err(|_| {
                    AdvisorError::InvalidInput(format!("months must be a whole number, got '{raw}'"))
                })?;
                parsed.with_months(months)
            }
            None => Ok(parsed),
        }
    }

    pub fn months(&self) -> u32 {
        self.months
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashPoint {
    pub month: u32,
    pub date: NaiveDate,
    pub cash_balance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseShare {
    pub category: String,
    pub share: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayReport {
    pub cash: f64,
    pub monthly_expenses: f64,
    pub monthly_revenue: f64,
    /// Expenses minus revenue. Negative when the business is cash-positive.
    pub net_monthly_burn: f64,
    /// Months until the cash is gone; `None` when net burn is not positive.
    pub runway_months: Option<f64>,
    /// Net burn as a percentage of current cash, per month.
    pub monthly_burn_rate: f64,
    pub risk_zone: RiskZone,
    pub projection: Vec<CashPoint>,
    pub expense_breakdown: Vec<ExpenseShare>,
}

/// Project `inputs` forward from `start`.
pub fn project(inputs: &RunwayInputs, start: NaiveDate) -> RunwayReport {
    let net_monthly_burn = inputs.monthly_expenses - inputs.monthly_revenue;
    let (runway_months, monthly_burn_rate) = if net_monthly_burn <= 0.0 {
        (None, 0.0)
    } else if inputs.cash == 0.0 {
        (Some(0.0), 100.0)
    } else {
        (
            Some(inputs.cash / net_monthly_burn),
            net_monthly_burn / inputs.cash * 100.0,
        )
    };

    RunwayReport {
        cash: inputs.cash,
        monthly_expenses: inputs.monthly_expenses,
        monthly_revenue: inputs.monthly_revenue,
        net_monthly_burn,
        runway_months,
        monthly_burn_rate,
        risk_zone: RiskZone::for_runway(runway_months),
        projection: cash_projection(inputs.cash, net_monthly_burn, inputs.months, start),
        expense_breakdown: expense_breakdown(inputs.monthly_expenses),
    }
}

/// [`project`] starting from the local date.
pub fn project_today(inputs: &RunwayInputs) -> RunwayReport {
    project(inputs, Local::now().date_naive())
}

/// Balance at the start and after each month, never shown below zero.
pub fn cash_projection(cash: f64, net_monthly_burn: f64, months: u32, start: NaiveDate) -> Vec<CashPoint> {
    let mut running = cash;
    (0..=months)
        .map(|month| {
            if month > 0 {
                running -= net_monthly_burn;
            }
            CashPoint {
                month,
                date: start
                    .checked_add_days(Days::new(u64::from(month) * DAYS_PER_MONTH))
                    .unwrap_or(NaiveDate::MAX),
                cash_balance: running.max(0.0),
            }
        })
        .collect()
}

pub fn expense_breakdown(monthly_expenses: f64) -> Vec<ExpenseShare> {
    EXPENSE_SHARES
        .iter()
        .map(|(category, share)| ExpenseShare {
            category: category.to_string(),
            share: *share,
            amount: monthly_expenses * share,
        })
        .collect()
}

impl RunwayReport {
    pub fn to_markdown(&self) -> String {
        let runway = match self.runway_months {
            Some(months) => format!("{months:.1} months"),
            None => "Not burning cash".to_string(),
        };
        let mut out = format!(
            "# Runway Projection\n\n\
             **Risk zone:** {}\n\n\
             **Runway:** {runway}\n\n\
             **Net monthly burn:** {}\n\n\
             **Monthly burn rate:** {:.1}% of cash\n\n\
             ## Cash Projection\n\n\
             | Month | Date | Cash Balance |\n|---:|---|---:|\n",
            self.risk_zone,
            currency(self.net_monthly_burn),
            self.monthly_burn_rate,
        );
        for point in &self.projection {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                point.month,
                point.date,
                currency(point.cash_balance)
            ));
        }
        out.push_str("\n## Expense Breakdown\n\n| Category | Share | Amount |\n|---|---:|---:|\n");
        for share in &self.expense_breakdown {
            out.push_str(&format!(
                "| {} | {:.0}% | {} |\n",
                share.category,
                share.share * 100.0,
                currency(share.amount)
            ));
        }
        out
    }
}
