//! Installed Server configuration (§3, §4.3).
//!
//! Configuration is persisted as `servers.json` under `$HARBOR_HOME`:
//! Installed Servers are written by the extension's settings UI via RPC,
//! not hand-edited, so JSON (what the Host Facade already speaks on the
//! wire) avoids a serialization format mismatch at the boundary.

use harbor_crypto::ContentHash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{McpError, McpResult};

/// How an Installed Server's package is fetched and run (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageKind {
    /// An npm package, run via a Node-based launcher (e.g. `npx`).
    Npm,
    /// A PyPI package, run via a Python-based launcher (e.g. `uvx`).
    Pypi,
    /// A prebuilt, directly executable binary.
    Binary,
    /// An OCI container image.
    Oci,
    /// A git repository, built and run from a checkout.
    Git,
    /// A remote server reachable over plain HTTP.
    Http,
    /// A remote server reachable over HTTP with Server-Sent Events.
    Sse,
}

/// Whether a stdio server runs directly or behind an isolated runner
/// child (§4.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// Spawn a self-fork runner that in turn spawns the server; a crash
    /// only takes down the runner.
    #[default]
    Isolated,
    /// Spawn the server process directly.
    Direct,
}

/// Policy for restarting a server when it dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicy {
    /// Maximum automatic restarts within `window_secs` before the server
    /// is quarantined (default 3, per §4.3).
    pub attempt_limit: u32,
    /// Sliding window, in seconds, the attempt counter resets after (§4.3
    /// "restart window": default 5 minutes of uptime, not just a process
    /// restart, so a server quarantined days ago is not stuck forever).
    pub window_secs: i64,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            attempt_limit: 3,
            window_secs: 5 * 60,
        }
    }
}

/// Configuration for one Installed Server (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique server id.
    #[serde(skip)]
    pub id: String,
    /// Human-readable name shown in UI.
    pub display_name: String,
    /// How the package is fetched/run.
    pub package_kind: PackageKind,
    /// Package identifier (npm/pypi name, OCI image, git URL) or, for
    /// `http`/`sse`, the server's own URL.
    pub package: String,
    /// Command to run (for process-based kinds; `None` for http/sse).
    pub command: Option<String>,
    /// Arguments for the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// URL for http/sse transport.
    pub url: Option<String>,
    /// Expected binary hash (`sha256:...`) for verification before spawn.
    pub binary_hash: Option<String>,
    /// Required environment variables and their values.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Working directory.
    pub cwd: Option<PathBuf>,
    /// Whether to auto-start on session begin.
    #[serde(default)]
    pub auto_start: bool,
    /// Description for users.
    pub description: Option<String>,
    /// Process isolation mode for stdio servers.
    #[serde(default)]
    pub isolation: Isolation,
    /// Restart policy when the server process dies.
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    /// Tool-allowlist restriction at the server level, intersected with
    /// any grant-level allowlist (§4.2).
    pub tool_allowlist: Option<Vec<String>>,
}

impl ServerConfig {
    /// Create a stdio server config backed by an npm package.
    #[must_use]
    pub fn npm(id: impl Into<String>, command: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            package_kind: PackageKind::Npm,
            package: String::new(),
            command: Some(command.into()),
            args: Vec::new(),
            url: None,
            binary_hash: None,
            env: HashMap::new(),
            cwd: None,
            auto_start: false,
            description: None,
            isolation: Isolation::Isolated,
            restart_policy: RestartPolicy::default(),
            tool_allowlist: None,
        }
    }

    /// Create an http/sse server config.
    #[must_use]
    pub fn remote(id: impl Into<String>, kind: PackageKind, url: impl Into<String>) -> Self {
        assert!(matches!(kind, PackageKind::Http | PackageKind::Sse));
        let id = id.into();
        let url = url.into();
        Self {
            display_name: id.clone(),
            id,
            package_kind: kind,
            package: url.clone(),
            command: None,
            args: Vec::new(),
            url: Some(url),
            binary_hash: None,
            env: HashMap::new(),
            cwd: None,
            auto_start: false,
            description: None,
            isolation: Isolation::Direct,
            restart_policy: RestartPolicy::default(),
            tool_allowlist: None,
        }
    }

    /// Whether this server is process-based (spawns a child), as opposed
    /// to a remote http/sse connection.
    #[must_use]
    pub fn is_process_based(&self) -> bool {
        !matches!(self.package_kind, PackageKind::Http | PackageKind::Sse)
    }

    /// Add arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set binary hash.
    #[must_use]
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.binary_hash = Some(hash.into());
        self
    }

    /// Add environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set auto-start.
    #[must_use]
    pub fn auto_start(mut self) -> Self {
        self.auto_start = true;
        self
    }

    /// Force direct (non-isolated) mode for this server.
    #[must_use]
    pub fn direct(mut self) -> Self {
        self.isolation = Isolation::Direct;
        self
    }

    /// Verify the configured binary hash, if any, against the resolved
    /// executable on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the binary cannot be found, cannot be read, or
    /// its hash does not match.
    pub fn verify_binary(&self) -> McpResult<()> {
        let Some(expected) = &self.binary_hash else {
            return Ok(());
        };
        let Some(command) = &self.command else {
            return Ok(());
        };

        let binary_path = which::which(command)
            .map_err(|e| McpError::ConfigError(format!("cannot find binary {command}: {e}")))?;

        let binary_data = std::fs::read(&binary_path)?;
        let actual_hash = ContentHash::hash(&binary_data);
        let actual_str = format!("sha256:{}", actual_hash.to_hex());

        if expected != &actual_str {
            return Err(McpError::BinaryHashMismatch {
                name: self.id.clone(),
                expected: expected.clone(),
                actual: actual_str,
            });
        }

        Ok(())
    }
}

/// The full set of Installed Servers, persisted to `servers.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServersConfig {
    /// Server configurations, keyed by id.
    #[serde(default)]
    pub servers: HashMap<String, ServerConfig>,
}

impl ServersConfig {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> McpResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| McpError::ConfigError(format!("invalid servers.json: {e}")))?;

        for (id, server) in &mut config.servers {
            server.id.clone_from(id);
        }

        Ok(config)
    }

    /// Load from `path`, or return an empty config if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: impl AsRef<Path>) -> McpResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialized.
    pub fn save(&self, path: impl AsRef<Path>) -> McpResult<()> {
        let content = serde_json::to_vec_pretty(self)
            .map_err(|e| McpError::SerializationError(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get a server config by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ServerConfig> {
        self.servers.get(id)
    }

    /// Add (or replace) a server config.
    pub fn add(&mut self, config: ServerConfig) {
        self.servers.insert(config.id.clone(), config);
    }

    /// Remove a server config.
    pub fn remove(&mut self, id: &str) -> Option<ServerConfig> {
        self.servers.remove(id)
    }

    /// List all server ids.
    #[must_use]
    pub fn list(&self) -> Vec<&str> {
        self.servers.keys().map(String::as_str).collect()
    }

    /// Servers configured for auto-start.
    #[must_use]
    pub fn auto_start_servers(&self) -> Vec<&ServerConfig> {
        self.servers.values().filter(|s| s.auto_start).collect()
    }
}
