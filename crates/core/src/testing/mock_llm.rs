//! Mock LLM client for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::generator::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage};

/// Mock implementation of the LlmClient trait.
///
/// Responses are queued and consumed in order. An empty queue answers with
/// [`LlmError::EmptyResponse`].
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    responses: Arc<RwLock<VecDeque<Result<String, LlmError>>>>,
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful completion.
    pub async fn push_text(&self, text: impl Into<String>) {
        self.responses.write().await.push_back(Ok(text.into()));
    }

    /// Queue a failure.
    pub async fn push_error(&self, error: LlmError) {
        self.responses.write().await.push_back(Err(error));
    }

    /// Requests seen so far.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.write().await.push(request);

        let next = self
            .responses
            .write()
            .await
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyResponse));

        next.map(|text| CompletionResponse {
            text,
            usage: LlmUsage::default(),
            model: "mock-model".to_string(),
        })
    }
}
