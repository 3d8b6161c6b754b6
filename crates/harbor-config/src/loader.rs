//! `harbor.toml` discovery and loading.
//!
//! Unlike the layered multi-source merge some configuration systems use,
//! Harbor has exactly one config file: `$HARBOR_HOME/harbor.toml` (or the
//! path passed to [`load_with_home`]). A missing file is not an error — it
//! simply yields [`HarborConfig::default`].

use std::path::{Path, PathBuf};

use harbor_core::HarborHome;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::types::HarborConfig;
use crate::validate;

/// Maximum allowed config file size (1 MB). Guards against an operator
/// accidentally pointing `$HARBOR_HOME` at a huge or adversarial file.
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Load `harbor.toml`, resolving the home directory via `$HARBOR_HOME`
/// (falling back to `$HOME/.harbor`), the same precedence rule used by
/// `HARBOR_MCP_ISOLATION` (§6).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the home directory cannot be resolved, the
/// file exists but is malformed, or validation fails.
pub fn load() -> ConfigResult<HarborConfig> {
    let home = HarborHome::resolve().map_err(|e| ConfigError::NoHomeDir(e.to_string()))?;
    load_from_path(&home.config_path())
}

/// Load `harbor.toml` from an explicit home directory, bypassing
/// `$HARBOR_HOME` resolution. Used by tests and by callers that already
/// know their home directory (e.g. `--home` CLI overrides).
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file exists but is malformed, or
/// validation fails.
pub fn load_with_home(home_dir: &Path) -> ConfigResult<HarborConfig> {
    load_from_path(&home_dir.join("harbor.toml"))
}

/// Load `harbor.toml` from an exact path. Returns [`HarborConfig::default`]
/// if the file does not exist.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file exists but cannot be read,
/// parsed, or fails validation.
pub fn load_from_path(path: &Path) -> ConfigResult<HarborConfig> {
    let Some(content) = try_read(path)? else {
        debug!(path = %path.display(), "harbor.toml not found, using defaults");
        return Ok(HarborConfig::default());
    };

    let config: HarborConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    validate::validate(&config)?;
    info!(path = %path.display(), "loaded harbor.toml");
    Ok(config)
}

/// Read a file's contents, returning `None` if it doesn't exist.
///
/// Reads before checking size to avoid a TOCTOU window between a
/// separate `stat` and the read.
fn try_read(path: &Path) -> ConfigResult<Option<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() as u64 > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    Ok(Some(content))
}

/// Default `harbor.toml` path under the resolved home directory, for
/// callers that want to display or watch it without re-deriving it.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the home directory cannot be resolved.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    let home = HarborHome::resolve().map_err(|e| ConfigError::NoHomeDir(e.to_string()))?;
    Ok(home.config_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_with_home(dir.path()).unwrap();
        assert_eq!(config.runtime.default_iteration_bound, 10);
    }

    #[test]
    fn loads_and_overrides_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("harbor.toml"),
            r#"
            [runtime]
            default_iteration_bound = 25

            [rate_budget]
            limit = 50
            window_secs = 30

            [providers.claude]
            base_url = "https://example.internal/v1"
            "#,
        )
        .unwrap();

        let config = load_with_home(dir.path()).unwrap();
        assert_eq!(config.runtime.default_iteration_bound, 25);
        assert_eq!(config.rate_budget.limit, 50);
        assert_eq!(
            config.providers["claude"].base_url.as_deref(),
            Some("https://example.internal/v1")
        );
    }

    #[test]
    fn malformed_toml_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("harbor.toml"), "not = [valid toml").unwrap();
        let result = load_with_home(dir.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn invalid_values_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("harbor.toml"),
            "[runtime]\ndefault_iteration_bound = 0\n",
        )
        .unwrap();
        let result = load_with_home(dir.path());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let huge = "# ".to_string() + &"x".repeat(MAX_CONFIG_FILE_SIZE as usize + 1);
        std::fs::write(dir.path().join("harbor.toml"), huge).unwrap();
        let result = load_with_home(dir.path());
        assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    }
}
