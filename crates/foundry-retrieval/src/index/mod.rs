pub mod reader;
pub mod schema;

pub use reader::{KnowledgeRetriever, ScoredDocument};
pub use schema::KnowledgeSchema;
