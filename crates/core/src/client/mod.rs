//! Presentation-side view of a submission.
//!
//! [`ClientStateMachine`] tracks one submission through
//! `idle → generating → (creating →) success | failed`. The server commits the
//! story before it answers, so there is no review step between generation and
//! creation. [`TicketClient`] drives the machine over HTTP.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Wire format of `POST /api/ai-ticket` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TicketResponse {
    Success {
        #[serde(rename = "shortcutStoryId")]
        shortcut_story_id: i64,
        message: String,
    },
    Error {
        message: String,
    },
}

/// Where a submission currently stands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClientState {
    #[default]
    Idle,
    Generating,
    Creating,
    Success { story_id: i64, message: String },
    Failed { message: String },
}

impl ClientState {
    pub fn label(&self) -> &'static str {
        match self {
            ClientState::Idle => "idle",
            ClientState::Generating => "generating",
            ClientState::Creating => "creating",
            ClientState::Success { .. } => "success",
            ClientState::Failed { .. } => "failed",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, ClientState::Generating | ClientState::Creating)
    }

    /// Banner text for the current state
    pub fn message(&self) -> Option<&str> {
        match self {
            ClientState::Idle => None,
            ClientState::Generating => Some("Generating ticket..."),
            ClientState::Creating => Some("Creating ticket..."),
            ClientState::Success { message, .. } | ClientState::Failed { message } => {
                Some(message)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("A submission is already in flight")]
    AlreadyInFlight,

    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

const UNKNOWN_ERROR: &str = "An unknown error occurred.";

#[derive(Debug, Clone, Default)]
pub struct ClientStateMachine {
    state: ClientState,
}

impl ClientStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    /// Start a submission. Refused while another one is still in flight.
    pub fn submit(&mut self) -> Result<(), ClientError> {
        if self.state.is_in_flight() {
            return Err(ClientError::AlreadyInFlight);
        }
        self.state = ClientState::Generating;
        Ok(())
    }

    /// Show the commit step; optional, resolution works from either in-flight state.
    pub fn mark_creating(&mut self) -> Result<(), ClientError> {
        match self.state {
            ClientState::Generating => {
                self.state = ClientState::Creating;
                Ok(())
            }
            _ => Err(self.invalid("mark creating")),
        }
    }

    /// Apply the server's answer. Success needs both a 2xx status and a success body.
    pub fn resolve(&mut self, status_ok: bool, response: TicketResponse) -> Result<(), ClientError> {
        if !self.state.is_in_flight() {
            return Err(self.invalid("resolve"));
        }

        self.state = match response {
            TicketResponse::Success {
                shortcut_story_id,
                message,
            } if status_ok => ClientState::Success {
                story_id: shortcut_story_id,
                message,
            },
            TicketResponse::Success { message, .. } | TicketResponse::Error { message } => {
                ClientState::Failed { message }
            }
        };
        Ok(())
    }

    /// The request never produced a readable answer.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), ClientError> {
        if !self.state.is_in_flight() {
            return Err(self.invalid("fail"));
        }
        let message = message.into();
        self.state = ClientState::Failed {
            message: if message.is_empty() {
                UNKNOWN_ERROR.to_string()
            } else {
                message
            },
        };
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> ClientError {
        ClientError::InvalidTransition {
            action,
            state: self.state.label(),
        }
    }
}

/// HTTP client for the ticket endpoint.
pub struct TicketClient {
    http: reqwest::Client,
    base_url: String,
    machine: ClientStateMachine,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitBody<'a> {
    prompt: &'a str,
    user_id: i64,
}

impl TicketClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "base URL must be http(s), got {}",
                base_url
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            machine: ClientStateMachine::new(),
        })
    }

    pub fn state(&self) -> &ClientState {
        self.machine.state()
    }

    /// Submit a prompt and wait for the final state.
    pub async fn submit(&mut self, prompt: &str, user_id: i64) -> Result<&ClientState, ClientError> {
        self.machine.submit()?;

        let result = self
            .http
            .post(format!("{}/api/ai-ticket", self.base_url))
            .json(&SubmitBody { prompt, user_id })
            .send()
            .await;

        match result {
            Ok(response) => {
                let status_ok = response.status().is_success();
                debug!(status = response.status().as_u16(), "Ticket endpoint answered");
                match response.json::<TicketResponse>().await {
                    Ok(body) => self.machine.resolve(status_ok, body)?,
                    Err(_) => self.machine.fail(UNKNOWN_ERROR)?,
                }
            }
            Err(e) => self.machine.fail(e.to_string())?,
        }

        Ok(self.machine.state())
    }
}
