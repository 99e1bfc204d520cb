pub mod audit;
pub mod client;
pub mod config;
pub mod document;
pub mod generator;
pub mod pipeline;
pub mod request;
pub mod shortcut;
pub mod testing;

pub use audit::{
    AuditError, AuditFilter, AuditRecord, AuditRecorder, AuditStore, PersistenceError,
    SqliteAuditStore,
};
pub use client::{ClientError, ClientState, ClientStateMachine, TicketClient, TicketResponse};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, RequiredSetting, SanitizedConfig,
};
pub use document::{parse_document, DocumentError, StructuredDocument};
pub use generator::{
    GeminiClient, GenerationError, LlmClient, LlmError, StructuredGenerator,
};
pub use pipeline::{
    PipelineError, PipelineOutcome, PipelineStage, PipelineSuccess, StageObserver,
    TicketPipeline,
};
pub use request::{validate_request, TicketRequest, ValidationError};
pub use shortcut::{
    ExternalTicketRef, ShortcutClient, StoryPayload, StoryTarget, TicketCreationError,
    TicketCreator, TicketingError, TicketingService,
};
