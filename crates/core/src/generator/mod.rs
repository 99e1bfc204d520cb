//! Structured document generation.
//!
//! Wraps a single LLM call: the raw prompt is embedded in a fixed instruction,
//! the model is constrained to the document schema, and its text output is
//! parsed into a [`StructuredDocument`]. One malformed response fails the run;
//! there is no retry.

mod llm;

pub use llm::{
    CompletionRequest, CompletionResponse, GeminiClient, LlmClient, LlmError, LlmUsage,
};

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::document::{document_schema, parse_document, DocumentError, StructuredDocument};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Model request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Model returned an invalid document: {0}")]
    InvalidDocument(#[from] DocumentError),
}

/// Build the generation instruction for a raw user prompt.
pub fn build_instruction(prompt: &str) -> String {
    format!(
        "You are a senior product manager and an expert technical writer.\n\
         Your task is to convert a raw, unstructured user prompt into a formal, structured JSON payload for a software development ticket.\n\
         The context is a user story or a request from a product manager.\n\
         Your output must be a single JSON object that strictly adheres to the provided schema.\n\
         \n\
         User Prompt:\n\
         \"{}\"",
        prompt
    )
}

/// Turns free text into a [`StructuredDocument`] through an [`LlmClient`].
pub struct StructuredGenerator {
    client: Arc<dyn LlmClient>,
}

impl StructuredGenerator {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Generate a document for `prompt` with exactly one model call.
    pub async fn generate(&self, prompt: &str) -> Result<StructuredDocument, GenerationError> {
        let request =
            CompletionRequest::new(build_instruction(prompt)).with_response_schema(document_schema());

        debug!(
            provider = self.client.provider(),
            model = self.client.model(),
            "Requesting structured document"
        );

        let response = self.client.complete(request).await?;

        info!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Model responded"
        );

        Ok(parse_document(&response.text)?)
    }
}
