use foundry_core::capability::CapabilityError;

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("Index error: {0}")]
    Index(String),

    #[error("No knowledge index at {0}")]
    Missing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tantivy::TantivyError> for RetrievalError {
    fn from(e: tantivy::TantivyError) -> Self {
        RetrievalError::Index(e.to_string())
    }
}

impl From<RetrievalError> for CapabilityError {
    fn from(e: RetrievalError) -> Self {
        CapabilityError::Index(e.to_string())
    }
}
