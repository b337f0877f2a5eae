//! Persistent token and cost accounting.

pub mod pricing;
pub mod store;
pub mod tokens;

pub use pricing::{ModelRates, PriceTable};
pub use store::{TrackedUsage, UsageLedger};
pub use tokens::TokenCounter;
