//! Read-only retrieval over a knowledge index built elsewhere.

pub mod error;
pub mod index;

pub use error::RetrievalError;
pub use index::{KnowledgeRetriever, KnowledgeSchema, ScoredDocument};
