//! The ticket pipeline.
//!
//! One run is strictly linear: check configuration, validate the request,
//! generate the document, create the story, write the audit row. The first
//! failing stage ends the run with its own error; nothing is retried and
//! nothing already done is undone. In particular a persistence failure leaves
//! the created story in Shortcut without an audit row.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tracing::{error, field, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::audit::{AuditRecord, AuditRecorder, PersistenceError};
use crate::config::{Config, ConfigError};
use crate::document::StructuredDocument;
use crate::generator::{GenerationError, StructuredGenerator};
use crate::request::{prompt_preview, validate_request, ValidationError};
use crate::shortcut::{ExternalTicketRef, TicketCreationError, TicketCreator};

/// Stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validate,
    Generate,
    CreateTicket,
    Persist,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validate => "validate",
            PipelineStage::Generate => "generate",
            PipelineStage::CreateTicket => "create_ticket",
            PipelineStage::Persist => "persist",
        }
    }
}

/// Terminal outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineOutcome {
    Success,
    ConfigurationFailed,
    ValidationFailed,
    GenerationFailed,
    TicketCreationFailed,
    PersistenceFailed,
}

impl PipelineOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineOutcome::Success => "success",
            PipelineOutcome::ConfigurationFailed => "configuration_failed",
            PipelineOutcome::ValidationFailed => "validation_failed",
            PipelineOutcome::GenerationFailed => "generation_failed",
            PipelineOutcome::TicketCreationFailed => "ticket_creation_failed",
            PipelineOutcome::PersistenceFailed => "persistence_failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Ticket creation error: {0}")]
    TicketCreation(#[from] TicketCreationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl PipelineError {
    pub fn outcome(&self) -> PipelineOutcome {
        match self {
            PipelineError::Configuration(_) => PipelineOutcome::ConfigurationFailed,
            PipelineError::Validation(_) => PipelineOutcome::ValidationFailed,
            PipelineError::Generation(_) => PipelineOutcome::GenerationFailed,
            PipelineError::TicketCreation(_) => PipelineOutcome::TicketCreationFailed,
            PipelineError::Persistence(_) => PipelineOutcome::PersistenceFailed,
        }
    }

    /// True when the requester sent a bad request (as opposed to a server or upstream fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, PipelineError::Validation(_))
    }

    /// Coarse, categorized message for the requester. Full detail goes to the logs.
    pub fn client_message(&self) -> String {
        match self {
            PipelineError::Configuration(e) => format!("Server configuration error: {}.", e),
            PipelineError::Validation(_) => "Invalid or missing prompt or userId.".to_string(),
            PipelineError::Generation(_) => {
                "Failed to generate a structured ticket from the prompt.".to_string()
            }
            PipelineError::TicketCreation(e) => {
                format!("Shortcut API error: {}", e.upstream_message())
            }
            PipelineError::Persistence(_) => {
                "Database error: failed to record the created ticket.".to_string()
            }
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineSuccess {
    pub run_id: Uuid,
    pub ticket: ExternalTicketRef,
    pub document: StructuredDocument,
    pub record: AuditRecord,
}

/// Called after every stage that ran, with how long it took.
pub type StageObserver = Arc<dyn Fn(PipelineStage, Duration) + Send + Sync>;

/// Sequences validation, generation, ticket creation and audit persistence.
pub struct TicketPipeline {
    config: Arc<Config>,
    generator: StructuredGenerator,
    creator: TicketCreator,
    recorder: AuditRecorder,
    stage_observer: Option<StageObserver>,
}

impl TicketPipeline {
    pub fn new(
        config: Arc<Config>,
        generator: StructuredGenerator,
        creator: TicketCreator,
        recorder: AuditRecorder,
    ) -> Self {
        Self {
            config,
            generator,
            creator,
            recorder,
            stage_observer: None,
        }
    }

    pub fn with_stage_observer(mut self, observer: StageObserver) -> Self {
        self.stage_observer = Some(observer);
        self
    }

    /// Run the pipeline for one raw request body.
    pub async fn run(&self, body: &Value) -> Result<PipelineSuccess, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("ticket_pipeline", %run_id, user_id = field::Empty);

        let result = self.run_stages(run_id, body).instrument(span.clone()).await;

        span.in_scope(|| match &result {
            Ok(success) => info!(
                story_id = success.ticket.external_id,
                audit_id = success.record.id,
                "Ticket pipeline succeeded"
            ),
            Err(PipelineError::Persistence(e)) => {
                error!(error = %e, "Ticket pipeline failed at persistence");
                warn!(
                    story_id = e.story_id,
                    "Story {} exists in Shortcut without an audit record",
                    e.story_id
                );
            }
            Err(e) => error!(
                outcome = e.outcome().as_str(),
                error = %e,
                "Ticket pipeline failed"
            ),
        });

        result
    }

    async fn run_stages(&self, run_id: Uuid, body: &Value) -> Result<PipelineSuccess, PipelineError> {
        self.config.check_required()?;

        let request = self
            .timed(PipelineStage::Validate, async { validate_request(body) })
            .await?;
        Span::current().record("user_id", request.user_id);
        info!(prompt = %prompt_preview(&request.prompt), "Request validated");

        let document = self
            .timed(PipelineStage::Generate, self.generator.generate(&request.prompt))
            .await?;

        let ticket = self
            .timed(PipelineStage::CreateTicket, self.creator.create(&document))
            .await?;

        let record = self
            .timed(PipelineStage::Persist, async {
                self.recorder.record(&request, &document, &ticket)
            })
            .await?;

        Ok(PipelineSuccess {
            run_id,
            ticket,
            document,
            record,
        })
    }

    async fn timed<T, E>(
        &self,
        stage: PipelineStage,
        step: impl Future<Output = Result<T, E>>,
    ) -> Result<T, E> {
        let start = Instant::now();
        let result = step.await;
        if let Some(observer) = &self.stage_observer {
            observer(stage, start.elapsed());
        }
        result
    }
}
