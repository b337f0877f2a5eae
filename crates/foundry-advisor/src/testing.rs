//! In-memory capability fakes for engine tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use foundry_core::capability::{
    CallOptions, CapabilityError, CompletionRequest, GenerationService, Retriever,
};
use foundry_core::model::Document;

/// Replays canned replies in order and records every request.
pub struct ScriptedGeneration {
    replies: Mutex<VecDeque<Result<String, CapabilityError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedGeneration {
    pub fn new(replies: Vec<Result<String, CapabilityError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGeneration {
    async fn complete(
        &self,
        request: &CompletionRequest,
        _options: &CallOptions,
    ) -> Result<String, CapabilityError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CapabilityError::Transport("script exhausted".into())))
    }
}

/// Returns a fixed ranked list (truncated to `k`) and counts calls.
pub struct FakeRetriever {
    documents: Vec<Document>,
    failure: Option<CapabilityError>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl FakeRetriever {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: CapabilityError) -> Self {
        Self {
            documents: Vec::new(),
            failure: Some(error),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for FakeRetriever {
    async fn top_k(
        &self,
        query: &str,
        k: usize,
        _options: &CallOptions,
    ) -> Result<Vec<Document>, CapabilityError> {
        self.queries.lock().unwrap().push((query.to_string(), k));
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(self.documents.iter().take(k).cloned().collect())
    }
}
