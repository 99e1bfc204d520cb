use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub shortcut: ShortcutConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    3000
}

/// Audit database configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Connection string: a file path, `sqlite://path`, `sqlite:path` or `:memory:`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl DatabaseConfig {
    /// Resolve the connection string into a SQLite database path.
    ///
    /// Returns `None` when no usable URL is configured.
    pub fn sqlite_path(&self) -> Option<PathBuf> {
        let url = non_empty(&self.url)?;
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        if path.is_empty() {
            None
        } else {
            Some(PathBuf::from(path))
        }
    }
}

/// Gemini (generative model) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeminiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    /// Custom API base URL (for proxies or tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            api_base: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

/// Shortcut (ticketing service) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShortcutConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Project that new stories are filed under
    #[serde(default = "default_project_id")]
    pub project_id: i64,
    /// Workflow state for new stories; unset or `1` lets Shortcut pick its default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_state_id: Option<i64>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            project_id: default_project_id(),
            workflow_state_id: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_project_id() -> i64 {
    1
}

fn default_timeout() -> u32 {
    30
}

/// Settings that must be present before the ticket pipeline may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredSetting {
    GeminiApiKey,
    ShortcutApiKey,
    DatabaseUrl,
}

impl RequiredSetting {
    pub const ALL: [RequiredSetting; 3] = [
        RequiredSetting::GeminiApiKey,
        RequiredSetting::ShortcutApiKey,
        RequiredSetting::DatabaseUrl,
    ];

    /// Environment variable name operators know this setting by
    pub fn env_name(&self) -> &'static str {
        match self {
            RequiredSetting::GeminiApiKey => "GEMINI_API_KEY",
            RequiredSetting::ShortcutApiKey => "SHORTCUT_API_KEY",
            RequiredSetting::DatabaseUrl => "DATABASE_URL",
        }
    }
}

impl Config {
    pub fn is_present(&self, setting: RequiredSetting) -> bool {
        match setting {
            RequiredSetting::GeminiApiKey => non_empty(&self.gemini.api_key).is_some(),
            RequiredSetting::ShortcutApiKey => non_empty(&self.shortcut.api_key).is_some(),
            RequiredSetting::DatabaseUrl => self.database.sqlite_path().is_some(),
        }
    }

    /// Required settings that are missing, in check order
    pub fn missing_required(&self) -> Vec<RequiredSetting> {
        RequiredSetting::ALL
            .into_iter()
            .filter(|s| !self.is_present(*s))
            .collect()
    }

    /// Fail on the first missing required setting.
    pub fn check_required(&self) -> Result<(), super::ConfigError> {
        match self.missing_required().first() {
            Some(setting) => Err(super::ConfigError::MissingRequired(*setting)),
            None => Ok(()),
        }
    }

    /// Presence map keyed by environment name, as reported by the health endpoint
    pub fn environment_check(&self) -> BTreeMap<&'static str, bool> {
        RequiredSetting::ALL
            .into_iter()
            .map(|s| (s.env_name(), self.is_present(s)))
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database_configured: bool,
    pub gemini: SanitizedGeminiConfig,
    pub shortcut: SanitizedShortcutConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeminiConfig {
    pub model: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedShortcutConfig {
    pub api_key_configured: bool,
    pub project_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_state_id: Option<i64>,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database_configured: config.is_present(RequiredSetting::DatabaseUrl),
            gemini: SanitizedGeminiConfig {
                model: config.gemini.model.clone(),
                api_key_configured: config.is_present(RequiredSetting::GeminiApiKey),
                timeout_secs: config.gemini.timeout_secs,
            },
            shortcut: SanitizedShortcutConfig {
                api_key_configured: config.is_present(RequiredSetting::ShortcutApiKey),
                project_id: config.shortcut.project_id,
                workflow_state_id: config.shortcut.workflow_state_id,
                timeout_secs: config.shortcut.timeout_secs,
            },
        }
    }
}
