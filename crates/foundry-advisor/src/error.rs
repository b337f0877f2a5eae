use foundry_core::capability::CapabilityError;
use foundry_core::CoreError;

/// Failures surfaced to the caller of a chat turn or tool request.
///
/// A model reply that fails artifact validation is not among them: the
/// generator recovers from that locally.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("Classification failed: {0}")]
    Classification(CapabilityError),

    #[error("Retrieval failed: {0}")]
    Retrieval(CapabilityError),

    #[error("Generation failed: {0}")]
    Generation(CapabilityError),

    #[error("Could not record usage: {0}")]
    LedgerPersistence(#[from] CoreError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conversation has no pending user message")]
    NoUserMessage,
}

impl AdvisorError {
    /// Whether the turn stopped because its cancel token fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            AdvisorError::Classification(CapabilityError::Cancelled)
                | AdvisorError::Retrieval(CapabilityError::Cancelled)
                | AdvisorError::Generation(CapabilityError::Cancelled)
        )
    }
}
