use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::call::{with_retry, CallOptions};
use super::error::CapabilityError;

/// One stateless completion: a single prompt in, a single text reply out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub model: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            model: model.into(),
        }
    }
}

/// A text-completion endpoint.
///
/// Implementations should honour `options.timeout` on their own transport, but
/// callers go through [`complete`], which enforces both the deadline and the
/// cancellation token regardless.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
        options: &CallOptions,
    ) -> Result<String, CapabilityError>;
}

/// Issue `request` with the deadline, cancellation and retry policy in `options`.
pub async fn complete(
    service: &dyn GenerationService,
    request: &CompletionRequest,
    options: &CallOptions,
) -> Result<String, CapabilityError> {
    with_retry(options, move || service.complete(request, options)).await
}
