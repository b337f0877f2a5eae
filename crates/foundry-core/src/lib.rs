//! Core data model, capability interfaces and the persistent usage ledger.

pub mod capability;
pub mod config;
pub mod error;
pub mod ledger;
pub mod model;

pub use error::CoreError;
