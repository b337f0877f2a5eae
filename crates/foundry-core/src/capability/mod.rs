//! Interfaces to the two external collaborators: the text-completion service
//! and the document retriever. Every call carries [`CallOptions`] so the caller
//! can bound latency and cancel work in flight.

pub mod call;
pub mod error;
pub mod generation;
pub mod retrieval;

pub use call::{guarded, with_retry, CallOptions, RetryPolicy};
pub use error::CapabilityError;
pub use generation::{complete, CompletionRequest, GenerationService};
pub use retrieval::{retrieve, Retriever};
pub use tokio_util::sync::CancellationToken;
