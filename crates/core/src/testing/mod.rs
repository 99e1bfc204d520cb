//! Testing utilities and mock implementations of the external service traits.
//!
//! The mocks let the pipeline run end to end without Gemini, Shortcut or a
//! database file.
//!
//! # Example
//!
//! ```rust,ignore
//! use ticketsmith_core::testing::{fixtures, MockLlmClient, MockTicketingService};
//!
//! let llm = MockLlmClient::new();
//! llm.push_text(fixtures::document_json("Add logout button")).await;
//!
//! let shortcut = MockTicketingService::with_next_id(42);
//! // Use in TicketPipeline...
//! ```

mod mock_audit_store;
mod mock_llm;
mod mock_ticketing;

pub use mock_audit_store::MockAuditStore;
pub use mock_llm::MockLlmClient;
pub use mock_ticketing::MockTicketingService;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::Config;
    use crate::document::StructuredDocument;
    use crate::shortcut::{ShortcutProject, ShortcutWorkflow, WorkflowState};

    /// A complete document with the given objective.
    pub fn document(objective: &str) -> StructuredDocument {
        StructuredDocument {
            objective: objective.to_string(),
            background: "Users have asked for this.".to_string(),
            scope_of_work: "Frontend change only.".to_string(),
            technical_requirements: "Reuse the existing session API.".to_string(),
            testing_requirements: "Manual QA on staging.".to_string(),
        }
    }

    /// The same document as model output text.
    pub fn document_json(objective: &str) -> String {
        serde_json::to_string(&document(objective)).unwrap_or_default()
    }

    /// Config with every required setting present.
    pub fn complete_config() -> Config {
        let mut config = Config::default();
        config.gemini.api_key = Some("test-gemini-key".to_string());
        config.shortcut.api_key = Some("test-shortcut-token".to_string());
        config.database.url = Some("sqlite://audit.db".to_string());
        config
    }

    pub fn shortcut_project(id: i64, name: &str) -> ShortcutProject {
        ShortcutProject {
            id,
            name: name.to_string(),
            description: None,
        }
    }

    /// A workflow with an "Unstarted"/"Done" pair of states.
    pub fn shortcut_workflow(id: i64, name: &str) -> ShortcutWorkflow {
        ShortcutWorkflow {
            id,
            name: name.to_string(),
            description: Some(format!("{} workflow", name)),
            states: vec![
                WorkflowState {
                    id: id * 10 + 1,
                    name: "Unstarted".to_string(),
                    description: None,
                    state_type: "unstarted".to_string(),
                },
                WorkflowState {
                    id: id * 10 + 2,
                    name: "Done".to_string(),
                    description: None,
                    state_type: "done".to_string(),
                },
            ],
        }
    }
}
