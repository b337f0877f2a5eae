pub mod fallback;
pub mod generator;
pub mod prompt;
pub mod render;
pub mod request;
pub mod runway;
pub mod schema;
pub mod validate;

pub use generator::{GeneratedArtifact, Origin, StructuredArtifactGenerator};
pub use request::{PitchExtras, ToolRequest, VentureBrief};
pub use runway::{RiskZone, RunwayInputs, RunwayReport};
pub use schema::{ArtifactKind, ArtifactSchema, FieldKind, FieldSpec};
pub use validate::ValidationFailure;
