use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use super::{AuditError, AuditRecord, AuditStore};
use crate::document::StructuredDocument;
use crate::request::TicketRequest;
use crate::shortcut::ExternalTicketRef;

/// The audit row could not be written. The external story already exists.
#[derive(Debug, Error)]
#[error("Failed to record story {story_id}: {source}")]
pub struct PersistenceError {
    pub story_id: i64,
    #[source]
    pub source: AuditError,
}

/// Writes exactly one audit row per created story.
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub fn record(
        &self,
        request: &TicketRequest,
        document: &StructuredDocument,
        ticket: &ExternalTicketRef,
    ) -> Result<AuditRecord, PersistenceError> {
        let now = Utc::now();
        let mut record = AuditRecord {
            id: 0, // Will be set by database
            user_id: request.user_id,
            raw_prompt: request.prompt.clone(),
            generated_output: document.clone(),
            shortcut_story_id: ticket.external_id,
            created_at: now,
            updated_at: now,
        };

        record.id = self
            .store
            .insert(&record)
            .map_err(|source| PersistenceError {
                story_id: ticket.external_id,
                source,
            })?;

        info!(
            audit_id = record.id,
            story_id = record.shortcut_story_id,
            user_id = record.user_id,
            "Audit record written"
        );

        Ok(record)
    }
}
