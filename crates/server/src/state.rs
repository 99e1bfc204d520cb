use std::sync::Arc;
use ticketsmith_core::{
    Config, ConfigError, PipelineError, RequiredSetting, SanitizedConfig, TicketPipeline,
    TicketingService,
};

/// Shared application state
pub struct AppState {
    config: Arc<Config>,
    pipeline: Option<Arc<TicketPipeline>>,
    ticketing: Option<Arc<dyn TicketingService>>,
}

impl AppState {
    /// `pipeline` and `ticketing` are `None` when the settings they need are
    /// missing. The server still starts so health checks can report it.
    pub fn new(
        config: Arc<Config>,
        pipeline: Option<Arc<TicketPipeline>>,
        ticketing: Option<Arc<dyn TicketingService>>,
    ) -> Self {
        Self {
            config,
            pipeline,
            ticketing,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(self.config.as_ref())
    }

    /// The pipeline, or the first missing required setting.
    pub fn pipeline(&self) -> Result<&TicketPipeline, PipelineError> {
        self.config.check_required()?;
        self.pipeline.as_deref().ok_or(PipelineError::Configuration(
            ConfigError::ValidationError("ticket pipeline was not initialized".to_string()),
        ))
    }

    /// The Shortcut client, available whenever the Shortcut key is set.
    pub fn ticketing(&self) -> Result<&dyn TicketingService, ConfigError> {
        if !self.config.is_present(RequiredSetting::ShortcutApiKey) {
            return Err(ConfigError::MissingRequired(RequiredSetting::ShortcutApiKey));
        }
        self.ticketing.as_deref().ok_or(ConfigError::ValidationError(
            "Shortcut client was not initialized".to_string(),
        ))
    }
}
