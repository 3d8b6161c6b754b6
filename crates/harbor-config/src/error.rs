//! Configuration error types.

use harbor_core::ErrorCode;

/// Errors raised while loading, parsing, or validating `harbor.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path that could not be read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file contents are not valid TOML, or don't match the
    /// expected shape.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path whose contents failed to parse.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A deserialized value failed a post-merge validation rule.
    #[error("invalid config field {field}: {message}")]
    ValidationError {
        /// Dotted field path, e.g. `rate_budget.limit`.
        field: String,
        /// Human-readable explanation.
        message: String,
    },

    /// The home directory could not be resolved (`$HARBOR_HOME`/`$HOME`
    /// both unset or invalid).
    #[error("could not resolve harbor home directory: {0}")]
    NoHomeDir(String),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Maps this error onto the shared [`ErrorCode`] taxonomy.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ReadError { .. } | Self::NoHomeDir(_) => ErrorCode::Internal,
            Self::ParseError { .. } | Self::ValidationError { .. } => ErrorCode::InvalidRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_maps_to_invalid_request() {
        let err = ConfigError::ValidationError {
            field: "rate_budget.limit".to_string(),
            message: "must be nonzero".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[test]
    fn no_home_dir_maps_to_internal() {
        let err = ConfigError::NoHomeDir("neither set".to_string());
        assert_eq!(err.code(), ErrorCode::Internal);
    }
}
