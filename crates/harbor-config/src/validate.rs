//! Post-parse configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::HarborConfig;

/// Validate a deserialized [`HarborConfig`].
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &HarborConfig) -> ConfigResult<()> {
    if config.runtime.default_iteration_bound == 0 {
        return Err(ConfigError::ValidationError {
            field: "runtime.default_iteration_bound".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }

    if config.rate_budget.limit == 0 {
        return Err(ConfigError::ValidationError {
            field: "rate_budget.limit".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }
    if config.rate_budget.window_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "rate_budget.window_secs".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }

    if config.restart.attempt_limit == 0 {
        return Err(ConfigError::ValidationError {
            field: "restart.attempt_limit".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }
    if config.restart.window_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "restart.window_secs".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }

    if config.stderr_ring_buffer.lines == 0 {
        return Err(ConfigError::ValidationError {
            field: "stderr_ring_buffer.lines".to_owned(),
            message: "must be at least 1".to_owned(),
        });
    }

    for (id, override_) in &config.providers {
        if let Some(url) = &override_.base_url {
            if url::Url::parse(url).is_err() {
                return Err(ConfigError::ValidationError {
                    field: format!("providers.{id}.base_url"),
                    message: format!("'{url}' is not a valid URI"),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&HarborConfig::default()).is_ok());
    }

    #[test]
    fn zero_iteration_bound_is_rejected() {
        let mut config = HarborConfig::default();
        config.runtime.default_iteration_bound = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn malformed_provider_url_is_rejected() {
        let mut config = HarborConfig::default();
        config.providers.insert(
            "claude".to_string(),
            crate::types::ProviderOverride {
                base_url: Some("not a url".to_string()),
            },
        );
        assert!(validate(&config).is_err());
    }
}
