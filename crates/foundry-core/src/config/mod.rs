pub mod settings;

pub use settings::{
    CallSettings, FoundryConfig, LedgerSettings, ModelSettings, ProviderSettings,
    RetrievalSettings, RetrySettings, WorkflowSettings,
};
