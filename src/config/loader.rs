//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::ApiConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ApiConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

/// Parse and validate configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<ApiConfig, ConfigError> {
    let config: ApiConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::DuplicatePolicy;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.rate_limit.limit, 5);
        assert_eq!(config.rate_limit.window_ms, 60_000);
        assert_eq!(config.subscriptions.default_source, "landing_page");
        assert_eq!(
            config.subscriptions.duplicate_policy,
            DuplicatePolicy::Confirm
        );
    }

    #[test]
    fn test_partial_config_overrides() {
        let config = parse_config(
            r#"
            environment = "production"

            [rate_limit]
            limit = 10
            window_ms = 1000

            [subscriptions]
            duplicate_policy = "conflict"
            "#,
        )
        .unwrap();

        assert!(config.environment.is_production());
        assert_eq!(config.rate_limit.limit, 10);
        assert_eq!(config.rate_limit.window_ms, 1000);
        assert_eq!(
            config.subscriptions.duplicate_policy,
            DuplicatePolicy::Conflict
        );
    }

    #[test]
    fn test_invalid_config_reports_validation() {
        let err = parse_config("[rate_limit]\nwindow_ms = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
