//! The advisory core: a relevance-gated chat workflow and a structured
//! artifact generator that never hands back a malformed artifact.

pub mod advisor;
pub mod artifact;
pub mod classifier;
pub mod error;
pub mod workflow;

mod tracking;

#[cfg(test)]
mod testing;

pub use advisor::{Advisor, AdvisorBuilder};
pub use artifact::{
    ArtifactKind, GeneratedArtifact, Origin, RunwayInputs, RunwayReport, StructuredArtifactGenerator,
    ToolRequest,
};
pub use classifier::QueryClassifier;
pub use error::AdvisorError;
pub use workflow::{EngineSettings, WorkflowEngine};
