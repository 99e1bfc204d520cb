use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Outbound timeouts are not 0
/// - Shortcut project id is positive
///
/// Presence of credentials is checked separately by [`Config::check_required`],
/// so a server can start and report what is missing.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.gemini.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "gemini.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.shortcut.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "shortcut.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.shortcut.project_id <= 0 {
        return Err(ConfigError::ValidationError(format!(
            "shortcut.project_id must be positive, got {}",
            config.shortcut.project_id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use std::net::IpAddr;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = Config::default();
        config.gemini.timeout_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("gemini.timeout_secs"));
    }

    #[test]
    fn test_validate_negative_project_fails() {
        let mut config = Config::default();
        config.shortcut.project_id = -3;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }
}
