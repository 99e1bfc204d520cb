//! Mock ticketing service for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::shortcut::{
    CreatedStory, ShortcutProject, ShortcutWorkflow, StoryPayload, TicketingError,
    TicketingService,
};

/// Mock implementation of the TicketingService trait.
///
/// Stories get sequential ids starting at the configured one. Stories are
/// never removed, matching the real service where a failed audit write leaves
/// the story in place.
#[derive(Debug, Clone)]
pub struct MockTicketingService {
    next_id: Arc<AtomicI64>,
    create_calls: Arc<AtomicUsize>,
    stories: Arc<RwLock<Vec<StoryPayload>>>,
    projects: Arc<RwLock<Vec<ShortcutProject>>>,
    workflows: Arc<RwLock<Vec<ShortcutWorkflow>>>,
    /// If set, the next create_story will fail with this error.
    next_create_error: Arc<RwLock<Option<TicketingError>>>,
    /// If set, listing calls fail with this error.
    list_error: Arc<RwLock<Option<TicketingError>>>,
}

impl Default for MockTicketingService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTicketingService {
    pub fn new() -> Self {
        Self::with_next_id(1)
    }

    pub fn with_next_id(id: i64) -> Self {
        Self {
            next_id: Arc::new(AtomicI64::new(id)),
            create_calls: Arc::new(AtomicUsize::new(0)),
            stories: Arc::new(RwLock::new(Vec::new())),
            projects: Arc::new(RwLock::new(Vec::new())),
            workflows: Arc::new(RwLock::new(Vec::new())),
            next_create_error: Arc::new(RwLock::new(None)),
            list_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn fail_next_create(&self, error: TicketingError) {
        *self.next_create_error.write().await = Some(error);
    }

    pub async fn fail_listing(&self, error: TicketingError) {
        *self.list_error.write().await = Some(error);
    }

    pub async fn set_projects(&self, projects: Vec<ShortcutProject>) {
        *self.projects.write().await = projects;
    }

    pub async fn set_workflows(&self, workflows: Vec<ShortcutWorkflow>) {
        *self.workflows.write().await = workflows;
    }

    /// Stories that were successfully created.
    pub async fn created_stories(&self) -> Vec<StoryPayload> {
        self.stories.read().await.clone()
    }

    /// Number of create_story calls, failed ones included.
    pub async fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    async fn check_list_error(&self) -> Result<(), TicketingError> {
        match self.list_error.read().await.as_ref() {
            Some(e) => Err(clone_error(e)),
            None => Ok(()),
        }
    }
}

fn clone_error(error: &TicketingError) -> TicketingError {
    match error {
        TicketingError::Http(m) => TicketingError::Http(m.clone()),
        TicketingError::Timeout(d) => TicketingError::Timeout(*d),
        TicketingError::Api { status, message } => TicketingError::Api {
            status: *status,
            message: message.clone(),
        },
        TicketingError::Parse(m) => TicketingError::Parse(m.clone()),
        TicketingError::NotConfigured(m) => TicketingError::NotConfigured(m.clone()),
    }
}

#[async_trait]
impl TicketingService for MockTicketingService {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_story(&self, payload: &StoryPayload) -> Result<CreatedStory, TicketingError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.next_create_error.write().await.take() {
            return Err(error);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.stories.write().await.push(payload.clone());

        Ok(CreatedStory {
            id,
            app_url: Some(format!("https://app.shortcut.com/mock/story/{}", id)),
        })
    }

    async fn list_projects(&self) -> Result<Vec<ShortcutProject>, TicketingError> {
        self.check_list_error().await?;
        Ok(self.projects.read().await.clone())
    }

    async fn list_workflows(&self) -> Result<Vec<ShortcutWorkflow>, TicketingError> {
        self.check_list_error().await?;
        Ok(self.workflows.read().await.clone())
    }
}
