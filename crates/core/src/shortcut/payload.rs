//! Typed story payload built from a structured document.

use serde::Serialize;

use super::TicketCreationError;
use crate::config::ShortcutConfig;
use crate::document::StructuredDocument;

/// Shortcut rejects story names longer than this.
pub const MAX_STORY_NAME_CHARS: usize = 512;

/// Workflow state id that means "let Shortcut choose".
pub const DEFAULT_WORKFLOW_STATE_ID: i64 = 1;

/// Where new stories are filed. Comes from configuration, never from users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoryTarget {
    pub project_id: i64,
    pub workflow_state_id: Option<i64>,
}

impl StoryTarget {
    pub fn new(project_id: i64) -> Self {
        Self {
            project_id,
            workflow_state_id: None,
        }
    }

    pub fn with_workflow_state(mut self, workflow_state_id: i64) -> Self {
        self.workflow_state_id = Some(workflow_state_id);
        self
    }
}

impl From<&ShortcutConfig> for StoryTarget {
    fn from(config: &ShortcutConfig) -> Self {
        Self {
            project_id: config.project_id,
            workflow_state_id: config.workflow_state_id,
        }
    }
}

/// Body of a create-story call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoryPayload {
    name: String,
    description: String,
    project_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    workflow_state_id: Option<i64>,
}

impl StoryPayload {
    /// Map a document onto a story.
    ///
    /// The objective becomes the name; the other four fields become the
    /// description, each under a bold header, in fixed order.
    pub fn from_document(
        document: &StructuredDocument,
        target: &StoryTarget,
    ) -> Result<Self, TicketCreationError> {
        let name = document.objective.clone();
        if name.trim().is_empty() {
            return Err(TicketCreationError::InvalidPayload(
                "story name is empty".to_string(),
            ));
        }
        let name_chars = name.chars().count();
        if name_chars > MAX_STORY_NAME_CHARS {
            return Err(TicketCreationError::InvalidPayload(format!(
                "story name is {} characters, limit is {}",
                name_chars, MAX_STORY_NAME_CHARS
            )));
        }

        Ok(Self {
            name,
            description: story_description(document),
            project_id: target.project_id,
            workflow_state_id: target
                .workflow_state_id
                .filter(|id| *id != DEFAULT_WORKFLOW_STATE_ID),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    pub fn workflow_state_id(&self) -> Option<i64> {
        self.workflow_state_id
    }
}

fn story_description(document: &StructuredDocument) -> String {
    let sections = [
        ("Background", &document.background),
        ("Scope of Work", &document.scope_of_work),
        ("Technical Requirements", &document.technical_requirements),
        ("Testing Requirements", &document.testing_requirements),
    ];

    sections
        .iter()
        .map(|(header, body)| format!("**{}:**\n{}", header, body))
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}
