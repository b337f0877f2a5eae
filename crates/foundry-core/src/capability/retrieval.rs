use async_trait::async_trait;

use super::call::{with_retry, CallOptions};
use super::error::CapabilityError;
use crate::model::Document;

/// Similarity search over a document index that someone else populates.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `k` documents, most similar first.
    async fn top_k(
        &self,
        query: &str,
        k: usize,
        options: &CallOptions,
    ) -> Result<Vec<Document>, CapabilityError>;
}

/// Query `retriever` with the deadline, cancellation and retry policy in `options`.
pub async fn retrieve(
    retriever: &dyn Retriever,
    query: &str,
    k: usize,
    options: &CallOptions,
) -> Result<Vec<Document>, CapabilityError> {
    with_retry(options, move || retriever.top_k(query, k, options)).await
}
