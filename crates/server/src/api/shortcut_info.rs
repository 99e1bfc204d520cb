//! `GET /api/shortcut-info`: projects and workflow states, for picking the
//! ids that go into the `[shortcut]` config section.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;

use ticketsmith_core::shortcut::{ShortcutProject, ShortcutWorkflow};
use ticketsmith_core::{ConfigError, TicketingError};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkflowSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WorkflowStateSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub state_type: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ShortcutInfoResponse {
    #[serde(rename_all = "camelCase")]
    Success {
        projects: Vec<ProjectSummary>,
        workflows: Vec<WorkflowSummary>,
        workflow_states: Vec<WorkflowStateSummary>,
    },
    Error {
        message: String,
    },
}

impl ShortcutInfoResponse {
    fn from_listing(projects: Vec<ShortcutProject>, workflows: Vec<ShortcutWorkflow>) -> Self {
        let workflow_states = workflows
            .iter()
            .flat_map(|w| w.states.iter())
            .map(|s| WorkflowStateSummary {
                id: s.id,
                name: s.name.clone(),
                description: s.description.clone(),
                state_type: s.state_type.clone(),
            })
            .collect();

        ShortcutInfoResponse::Success {
            projects: projects
                .into_iter()
                .map(|p| ProjectSummary {
                    id: p.id,
                    name: p.name,
                    description: p.description,
                })
                .collect(),
            workflows: workflows
                .into_iter()
                .map(|w| WorkflowSummary {
                    id: w.id,
                    name: w.name,
                    description: w.description,
                })
                .collect(),
            workflow_states,
        }
    }

    fn error(message: String) -> (StatusCode, Json<Self>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ShortcutInfoResponse::Error { message }),
        )
    }
}

pub async fn get_shortcut_info(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ShortcutInfoResponse>) {
    let ticketing = match state.ticketing() {
        Ok(t) => t,
        Err(e @ ConfigError::MissingRequired(_)) => {
            return ShortcutInfoResponse::error(format!("{} environment variable", e))
        }
        Err(e) => return ShortcutInfoResponse::error(e.to_string()),
    };

    let listing = async {
        let projects = ticketing.list_projects().await?;
        let workflows = ticketing.list_workflows().await?;
        Ok::<_, TicketingError>((projects, workflows))
    };

    match listing.await {
        Ok((projects, workflows)) => (
            StatusCode::OK,
            Json(ShortcutInfoResponse::from_listing(projects, workflows)),
        ),
        Err(e) => {
            error!(error = %e, "Failed to fetch Shortcut info");
            ShortcutInfoResponse::error(e.upstream_message())
        }
    }
}
