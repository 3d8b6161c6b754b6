//! `tracing-subscriber` setup (SPEC_FULL.md §6 ambient logging): an
//! `EnvFilter` defaulting to `info` and overridable via `RUST_LOG`, with
//! a JSON-lines formatter when stdout is not a TTY — the default when
//! Harbor is running as a native-messaging host, since stdout there is
//! the frame channel. Logs are written to stderr unconditionally so they
//! can never corrupt the frame stream.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

use crate::error::{TelemetryError, TelemetryResult};

/// Output formatting for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, multi-line, ANSI-colored when the target is a TTY.
    Pretty,
    /// Single-line JSON objects, for log aggregation.
    Json,
    /// Single-line human-readable, no ANSI.
    Compact,
}

impl LogFormat {
    /// Pick a format by inspecting whether `stream` is a terminal:
    /// [`LogFormat::Pretty`] when it is, [`LogFormat::Json`] otherwise.
    #[must_use]
    pub fn detect(stream: &impl IsTerminal) -> Self {
        if stream.is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Where log lines are written. Harbor's native-messaging host always
/// uses [`LogTarget::Stderr`] — stdout is reserved for framed RPC output
/// and writing a log line there would corrupt the stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error (the default, and the only safe choice while
    /// stdout carries framed protocol traffic).
    #[default]
    Stderr,
    /// Standard output. Only appropriate for non-native-messaging
    /// entrypoints (e.g. a CLI subcommand run interactively).
    Stdout,
}

/// Logging configuration, built up with a fluent API before
/// [`setup_logging`] installs the global subscriber.
#[derive(Debug, Clone)]
pub struct LogConfig {
    level: String,
    format: LogFormat,
    target: LogTarget,
    directives: Vec<String>,
}

impl LogConfig {
    /// Start a config with a base level (`"info"`, `"debug"`, ...).
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::Json,
            target: LogTarget::Stderr,
            directives: Vec::new(),
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the output target.
    #[must_use]
    pub fn with_target(mut self, target: LogTarget) -> Self {
        self.target = target;
        self
    }

    /// Add a per-module filter directive (e.g. `"harbor_mcp=trace"`),
    /// layered on top of the base level.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        if let Ok(from_env) = std::env::var("RUST_LOG") {
            return EnvFilter::try_new(from_env)
                .map_err(|e| TelemetryError::ConfigError(e.to_string()));
        }
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;
        for directive in &self.directives {
            filter = filter.add_directive(
                directive
                    .parse()
                    .map_err(|e: tracing_subscriber::filter::ParseError| {
                        TelemetryError::ConfigError(e.to_string())
                    })?,
            );
        }
        Ok(filter)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

/// Install the global `tracing` subscriber per `config`.
///
/// # Errors
///
/// Returns an error if the filter directives are malformed or a global
/// subscriber is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.env_filter()?;
    let writer: fn() -> Box<dyn std::io::Write> = match config.target {
        LogTarget::Stderr => || Box::new(std::io::stderr()),
        LogTarget::Stdout => || Box::new(std::io::stdout()),
    };

    let registry = tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer);

    let result = match config.format {
        LogFormat::Json => registry.json().try_init(),
        LogFormat::Pretty => registry.pretty().try_init(),
        LogFormat::Compact => registry.compact().try_init(),
    };

    result.map_err(|e| TelemetryError::InitError(e.to_string()))
}

/// Install a subscriber with Harbor's native-messaging defaults: level
/// `info` (overridable via `RUST_LOG`), stderr target, and a format
/// auto-detected from whether stderr is a TTY.
///
/// # Errors
///
/// Returns an error under the same conditions as [`setup_logging`].
pub fn setup_default_logging() -> TelemetryResult<()> {
    let format = LogFormat::detect(&std::io::stderr());
    setup_logging(&LogConfig::new("info").with_format(format).with_target(LogTarget::Stderr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_accumulates_directives() {
        let config = LogConfig::new("info")
            .with_directive("harbor_mcp=trace")
            .with_directive("harbor_runtime=debug");
        assert_eq!(config.directives.len(), 2);
    }

    #[test]
    fn format_detect_picks_json_for_non_terminal() {
        // A Vec<u8> is never a terminal.
        struct NotATerminal;
        impl IsTerminal for NotATerminal {
            fn is_terminal(&self) -> bool {
                false
            }
        }
        assert_eq!(LogFormat::detect(&NotATerminal), LogFormat::Json);
    }

    #[test]
    fn default_target_is_stderr() {
        assert_eq!(LogTarget::default(), LogTarget::Stderr);
    }
}
