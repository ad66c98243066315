//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (window > 0, pool size > 0)
//! - Catch credentials left at placeholder values in production
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ApiConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{AdminConfig, ApiConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g., "rate_limit.window_ms").
    pub field: String,
    /// Human-readable explanation.
    pub reason: String,
}

impl ValidationError {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ApiConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {:?}", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new(
            "listener.max_body_bytes",
            "must be greater than zero",
        ));
    }

    if config.database.path.is_empty() {
        errors.push(ValidationError::new("database.path", "must not be empty"));
    }
    if config.database.max_connections == 0 {
        errors.push(ValidationError::new(
            "database.max_connections",
            "must be greater than zero",
        ));
    }

    // limit = 0 is legal (it means "reject everything"), the window is not.
    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new(
            "rate_limit.window_ms",
            "must be greater than zero",
        ));
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            "must be greater than zero",
        ));
    }

    if config.subscriptions.default_source.is_empty() {
        errors.push(ValidationError::new(
            "subscriptions.default_source",
            "must not be empty",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "not a socket address: {:?}",
                config.observability.metrics_address
            ),
        ));
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        } else if config.environment.is_production()
            && config.admin.api_key == AdminConfig::default().api_key
        {
            errors.push(ValidationError::new(
                "admin.api_key",
                "placeholder key is not allowed in production",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Environment;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ApiConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_limit_is_valid_zero_window_is_not() {
        let mut config = ApiConfig::default();
        config.rate_limit.limit = 0;
        assert!(validate_config(&config).is_ok());

        config.rate_limit.window_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "rate_limit.window_ms"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ApiConfig::default();
        config.listener.bind_address = "not-an-addr".to_string();
        config.database.path = String::new();
        config.database.max_connections = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_placeholder_admin_key_rejected_in_production() {
        let mut config = ApiConfig::default();
        config.admin.enabled = true;
        assert!(validate_config(&config).is_ok());

        config.environment = Environment::Production;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "admin.api_key"));
    }
}
