//! Shortcut REST API v3 client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{
    CreatedStory, ShortcutProject, ShortcutWorkflow, StoryPayload, TicketingError,
    TicketingService,
};
use crate::config::ShortcutConfig;

const SHORTCUT_API_BASE: &str = "https://api.app.shortcut.com/api/v3";

/// HTTP client for the Shortcut API.
pub struct ShortcutClient {
    client: Client,
    api_base: String,
    api_token: String,
    timeout: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct ShortcutErrorBody {
    message: String,
}

impl ShortcutClient {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: SHORTCUT_API_BASE.to_string(),
            api_token: api_token.into(),
            timeout: None,
        }
    }

    /// Build a client from configuration, applying the request timeout.
    pub fn from_config(config: &ShortcutConfig) -> Result<Self, TicketingError> {
        let api_token = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                TicketingError::NotConfigured("Shortcut API key is required".to_string())
            })?;

        let timeout = Duration::from_secs(u64::from(config.timeout_secs));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TicketingError::Http(e.to_string()))?;

        let mut shortcut = Self::new(api_token);
        shortcut.client = client;
        shortcut.timeout = Some(timeout);
        if let Some(api_base) = &config.api_base {
            shortcut.api_base = api_base.clone();
        }
        Ok(shortcut)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }

    fn transport_error(&self, e: reqwest::Error) -> TicketingError {
        match self.timeout {
            Some(timeout) if e.is_timeout() => TicketingError::Timeout(timeout),
            _ => TicketingError::Http(e.to_string()),
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: Response,
        what: &str,
    ) -> Result<T, TicketingError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ShortcutErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or(body);
            return Err(TicketingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TicketingError::Parse(format!("Failed to parse {}: {}", what, e)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, TicketingError> {
        debug!("Shortcut GET /{}", path);

        let response = self
            .client
            .get(self.url(path))
            .header("Shortcut-Token", &self.api_token)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.read_json(response, path).await
    }
}

#[async_trait]
impl TicketingService for ShortcutClient {
    fn name(&self) -> &str {
        "shortcut"
    }

    async fn create_story(&self, payload: &StoryPayload) -> Result<CreatedStory, TicketingError> {
        debug!(
            project_id = payload.project_id(),
            workflow_state_id = ?payload.workflow_state_id(),
            "Shortcut POST /stories"
        );

        let response = self
            .client
            .post(self.url("stories"))
            .header("Shortcut-Token", &self.api_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        self.read_json(response, "created story").await
    }

    async fn list_projects(&self) -> Result<Vec<ShortcutProject>, TicketingError> {
        self.get("projects").await
    }

    async fn list_workflows(&self) -> Result<Vec<ShortcutWorkflow>, TicketingError> {
        self.get("workflows").await
    }
}
