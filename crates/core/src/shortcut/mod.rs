//! Ticket creation in Shortcut.
//!
//! [`TicketCreator`] turns a [`StructuredDocument`] into a typed
//! [`StoryPayload`] and creates the story through a [`TicketingService`].
//! The same service trait backs the read-only project/workflow listing.

mod client;
mod payload;

pub use client::ShortcutClient;
pub use payload::{StoryPayload, StoryTarget, DEFAULT_WORKFLOW_STATE_ID, MAX_STORY_NAME_CHARS};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::document::StructuredDocument;

/// Errors from the ticketing service.
#[derive(Debug, Error)]
pub enum TicketingError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl TicketingError {
    /// The upstream's own message where there is one, for surfacing verbatim.
    pub fn upstream_message(&self) -> String {
        match self {
            TicketingError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Story as returned by the create call. Only the id matters to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedStory {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutProject {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutWorkflow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub states: Vec<WorkflowState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// "unstarted", "started" or "done"
    #[serde(rename = "type")]
    pub state_type: String,
}

/// External project-tracking service.
#[async_trait]
pub trait TicketingService: Send + Sync {
    /// Service name for logging
    fn name(&self) -> &str;

    /// Create one story. No retries.
    async fn create_story(&self, payload: &StoryPayload) -> Result<CreatedStory, TicketingError>;

    async fn list_projects(&self) -> Result<Vec<ShortcutProject>, TicketingError>;

    /// Workflows, each carrying its states.
    async fn list_workflows(&self) -> Result<Vec<ShortcutWorkflow>, TicketingError>;
}

/// Identifier assigned to a story by the ticketing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTicketRef {
    pub external_id: i64,
}

#[derive(Debug, Error)]
pub enum TicketCreationError {
    #[error("Invalid story payload: {0}")]
    InvalidPayload(String),

    #[error("Ticketing service error: {0}")]
    Upstream(#[from] TicketingError),
}

impl TicketCreationError {
    /// Message suitable for showing to the requester.
    pub fn upstream_message(&self) -> String {
        match self {
            TicketCreationError::InvalidPayload(reason) => reason.clone(),
            TicketCreationError::Upstream(e) => e.upstream_message(),
        }
    }
}

/// Maps documents to stories and creates them.
pub struct TicketCreator {
    service: Arc<dyn TicketingService>,
    target: StoryTarget,
}

impl TicketCreator {
    pub fn new(service: Arc<dyn TicketingService>, target: StoryTarget) -> Self {
        Self { service, target }
    }

    pub async fn create(
        &self,
        document: &StructuredDocument,
    ) -> Result<ExternalTicketRef, TicketCreationError> {
        let payload = StoryPayload::from_document(document, &self.target)?;
        let story = self.service.create_story(&payload).await?;

        info!(
            service = self.service.name(),
            story_id = story.id,
            project_id = payload.project_id(),
            "Story created"
        );

        Ok(ExternalTicketRef {
            external_id: story.id,
        })
    }
}
