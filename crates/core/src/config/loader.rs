use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Flat environment variable names accepted alongside the prefixed form,
/// mapped to their config keys.
const PLAIN_ENV_KEYS: &[(&str, &str)] = &[
    ("GEMINI_API_KEY", "gemini.api_key"),
    ("SHORTCUT_API_KEY", "shortcut.api_key"),
    ("SHORTCUT_PROJECT_ID", "shortcut.project_id"),
    ("SHORTCUT_WORKFLOW_STATE_ID", "shortcut.workflow_state_id"),
    ("DATABASE_URL", "database.url"),
];

fn plain_env() -> Env {
    let names: Vec<&str> = PLAIN_ENV_KEYS.iter().map(|(name, _)| *name).collect();
    Env::raw().only(&names).map(|key| {
        PLAIN_ENV_KEYS
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, path)| (*path).into())
            .unwrap_or_else(|| key.as_str().to_string().into())
    })
}

fn with_env(figment: Figment) -> Figment {
    figment
        .merge(plain_env())
        .merge(Env::prefixed("TICKETSMITH_").split("__"))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    figment
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(with_env(Figment::new().merge(Toml::file(path))))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(with_env(Figment::new()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
