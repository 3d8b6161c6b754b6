//! The MCP Supervisor (§4.3): owns every live [`Connection`] to an
//! Installed Server and presents one capability surface regardless of
//! whether a given server runs directly or behind an isolated runner.

use std::borrow::Cow;
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use harbor_events::{EventBus, EventMetadata, HarborEvent};
use rmcp::model::{CallToolRequestParams, GetPromptRequestParams, ReadResourceRequestParams};
use rmcp::service::RunningService;
use rmcp::transport::{ConfigureCommandExt, SseClientTransport, StreamableHttpClientTransport, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use serde_json::Value;
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::config::{Isolation, ServerConfig, ServersConfig};
use crate::connection::{Connection, ConnectionKind};
use crate::error::{McpError, McpResult};
use crate::types::{
    PromptContent, PromptDefinition, ResourceContent, ResourceDefinition, ToolDefinition,
    ToolResult,
};

/// Name of the environment variable toggling process isolation globally.
///
/// `"0"` disables isolation (servers spawn directly); anything else,
/// including unset, enables it. Read once when the [`McpSupervisor`] is
/// constructed so the effective mode is fixed for the process lifetime —
/// tests that want deterministic direct-mode behavior set this before
/// constructing a supervisor rather than racing a live toggle.
pub const ISOLATION_ENV_VAR: &str = "HARBOR_MCP_ISOLATION";

fn isolation_enabled_from_env() -> bool {
    std::env::var(ISOLATION_ENV_VAR)
        .map(|v| v != "0")
        .unwrap_or(true)
}

/// An established MCP peer connection, as seen by the supervisor.
enum Peer {
    /// A connected rmcp client over stdio or SSE/HTTP transport.
    Running(RunningService<RoleClient, HarborClientHandler>),
}

struct ServerState {
    config: ServerConfig,
    connection: Option<Connection>,
    peer: Option<Peer>,
    /// Start of the current restart-counting window.
    window_start: chrono::DateTime<Utc>,
    quarantined: bool,
}

impl ServerState {
    fn new(config: ServerConfig) -> Self {
        Self {
            config,
            connection: None,
            peer: None,
            window_start: Utc::now(),
            quarantined: false,
        }
    }
}

/// Owns the lifecycle of every Installed Server connection: spawning,
/// crash recovery, tool-list caching, and dispatch (§4.3).
pub struct McpSupervisor {
    servers: RwLock<HashMap<String, ServerState>>,
    isolation_enabled: bool,
    events: EventBus,
}

impl McpSupervisor {
    /// Create a supervisor with no servers configured.
    ///
    /// Captures `$HARBOR_MCP_ISOLATION` once; later changes to the
    /// variable have no effect on this instance (§9 design note).
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            servers: RwLock::new(HashMap::new()),
            isolation_enabled: isolation_enabled_from_env(),
            events,
        }
    }

    /// Create a supervisor with an explicit isolation override, bypassing
    /// the environment variable. Used by tests that need a deterministic
    /// mode regardless of the process environment.
    #[must_use]
    pub fn with_isolation(events: EventBus, isolation_enabled: bool) -> Self {
        Self {
            servers: RwLock::new(HashMap::new()),
            isolation_enabled,
            events,
        }
    }

    /// Load Installed Servers from configuration, without connecting any.
    pub async fn load_config(&self, config: ServersConfig) {
        let mut servers = self.servers.write().await;
        for (id, server_config) in config.servers {
            servers.insert(id, ServerState::new(server_config));
        }
    }

    /// Register (or replace) a single Installed Server's configuration.
    pub async fn add_server(&self, config: ServerConfig) {
        let mut servers = self.servers.write().await;
        servers.insert(config.id.clone(), ServerState::new(config));
    }

    /// Seed a registered server's connection directly, bypassing spawn.
    ///
    /// For tests that need `list_tools`/`list_resources`/`list_prompts`
    /// to see a server's catalog without a real child process or MCP
    /// handshake. `call_tool`/`read_resource`/`get_prompt` still return
    /// [`McpError::ServerNotRunning`] afterwards, since no peer is
    /// attached — only the cached descriptors are faked.
    #[cfg(feature = "test-support")]
    pub async fn seed_connection(&self, id: &str, connection: Connection) {
        let mut servers = self.servers.write().await;
        if let Some(state) = servers.get_mut(id) {
            state.connection = Some(connection);
        }
    }

    /// Remove an Installed Server, disconnecting it first if live.
    ///
    /// # Errors
    ///
    /// Returns an error if the server is connected and cannot be cleanly
    /// disconnected.
    pub async fn remove_server(&self, id: &str) -> McpResult<()> {
        self.disconnect(id).await.ok();
        self.servers.write().await.remove(id);
        Ok(())
    }

    fn connection_kind(&self, config: &ServerConfig) -> ConnectionKind {
        if !config.is_process_based() {
            return match config.package_kind {
                crate::config::PackageKind::Sse => ConnectionKind::Sse,
                _ => ConnectionKind::Http,
            };
        }
        match config.isolation {
            _ if !self.isolation_enabled => ConnectionKind::StdioDirect,
            Isolation::Direct => ConnectionKind::StdioDirect,
            Isolation::Isolated => ConnectionKind::StdioIsolated,
        }
    }

    /// Connect to an Installed Server, spawning its process (or runner
    /// child) and caching its tool/resource/prompt descriptors.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ServerNotFound`] if unregistered,
    /// [`McpError::ServerQuarantined`] if over the crash-attempt limit,
    /// or a spawn/connect failure.
    pub async fn connect(self: &Arc<Self>, id: &str) -> McpResult<()> {
        let config = {
            let servers = self.servers.read().await;
            let state = servers
                .get(id)
                .ok_or_else(|| McpError::ServerNotFound { name: id.into() })?;
            if state.quarantined {
                return Err(McpError::ServerQuarantined {
                    name: id.into(),
                    attempts: state.config.restart_policy.attempt_limit,
                });
            }
            state.config.clone()
        };

        config.verify_binary()?;

        let kind = self.connection_kind(&config);
        let (peer, pid) = spawn_peer(&config, kind)
            .await
            .map_err(|e| McpError::SpawnFailed {
                name: id.to_string(),
                reason: e.to_string(),
            })?;

        let tools = peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::ToolCallFailed {
                server: id.to_string(),
                tool: "listTools".into(),
                reason: e.to_string(),
            })?
            .into_iter()
            .map(|t| ToolDefinition::from_rmcp(&t, id))
            .collect();

        let mut connection = Connection::new(id, kind, pid);
        connection.catalog.tools = tools;

        {
            let mut servers = self.servers.write().await;
            if let Some(state) = servers.get_mut(id) {
                state.connection = Some(connection);
                state.peer = Some(Peer::Running(peer));
            }
        }

        self.events.publish(HarborEvent::ServerStarted {
            metadata: EventMetadata::new("mcp"),
            server_id: id.to_string(),
        });

        info!(server = id, ?kind, "MCP server connected");

        self.spawn_exit_monitor(id.to_string());

        Ok(())
    }

    /// Watch a freshly connected peer for exit, driving crash recovery
    /// (§4.3 scenario 5) once it disappears. Polls [`RunningService::is_closed`]
    /// rather than awaiting an exit future — `rmcp` does not expose the
    /// real exit code through this signal, so a detected exit is recorded
    /// as `record_crash(id, None)`.
    fn spawn_exit_monitor(self: &Arc<Self>, id: String) {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(500)).await;

                let closed = {
                    let servers = supervisor.servers.read().await;
                    match servers.get(&id).and_then(|s| s.peer.as_ref()) {
                        Some(Peer::Running(peer)) => peer.is_closed(),
                        None => return,
                    }
                };

                if !closed {
                    continue;
                }

                warn!(server = %id, "MCP server connection closed unexpectedly");
                if supervisor.record_crash(&id, None).await.is_err() {
                    return;
                }
                if let Err(e) = supervisor.connect(&id).await {
                    warn!(server = %id, error = %e, "automatic respawn after crash failed");
                }
                return;
            }
        });
    }

    /// Disconnect an Installed Server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ServerNotFound`] if unregistered.
    pub async fn disconnect(&self, id: &str) -> McpResult<()> {
        let mut servers = self.servers.write().await;
        let state = servers
            .get_mut(id)
            .ok_or_else(|| McpError::ServerNotFound { name: id.into() })?;

        if let Some(Peer::Running(peer)) = state.peer.take() {
            let _ = peer.cancel().await;
        }
        state.connection = None;
        Ok(())
    }

    /// Record a crash observed on `id` and decide whether it can still be
    /// restarted, applying the sliding restart window (§4.3).
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ServerQuarantined`] once the attempt limit is
    /// exceeded within the window.
    pub async fn record_crash(&self, id: &str, exit_code: Option<i32>) -> McpResult<()> {
        let (attempt, limit) = {
            let mut servers = self.servers.write().await;
            let state = servers
                .get_mut(id)
                .ok_or_else(|| McpError::ServerNotFound { name: id.into() })?;

            let now = Utc::now();
            let window_secs = state.config.restart_policy.window_secs;
            if (now - state.window_start).num_seconds() > window_secs {
                state.window_start = now;
                if let Some(conn) = &mut state.connection {
                    conn.crash_count = 0;
                }
            }

            let crash_count = state
                .connection
                .as_mut()
                .map(|c| {
                    c.crash_count += 1;
                    c.crash_count
                })
                .unwrap_or(1);

            let limit = state.config.restart_policy.attempt_limit;
            if crash_count > limit {
                state.quarantined = true;
            }
            (crash_count, limit)
        };

        self.events.publish(HarborEvent::ServerCrashed {
            metadata: EventMetadata::new("mcp"),
            server_id: id.to_string(),
            exit_code,
            attempt,
            limit,
        });

        if attempt > limit {
            self.events.publish(HarborEvent::ServerQuarantined {
                metadata: EventMetadata::new("mcp"),
                server_id: id.to_string(),
            });
            warn!(server = id, attempt, limit, "server quarantined");
            return Err(McpError::ServerQuarantined {
                name: id.to_string(),
                attempts: attempt,
            });
        }

        Ok(())
    }

    /// Append a line to a connection's stderr ring buffer.
    pub async fn record_stderr(&self, id: &str, line: impl Into<String>) {
        let mut servers = self.servers.write().await;
        if let Some(conn) = servers.get_mut(id).and_then(|s| s.connection.as_mut()) {
            conn.stderr.push(line);
        }
    }

    /// Tail of the retained stderr output for a connection.
    #[must_use = "the returned lines are lost if not inspected"]
    pub async fn stderr_tail(&self, id: &str) -> Vec<String> {
        let servers = self.servers.read().await;
        servers
            .get(id)
            .and_then(|s| s.connection.as_ref())
            .map(|c| c.stderr.tail().into_iter().map(String::from).collect())
            .unwrap_or_default()
    }

    /// The pid backing a connection, if it is process-based and running.
    pub async fn pid(&self, id: &str) -> Option<u32> {
        let servers = self.servers.read().await;
        servers.get(id)?.connection.as_ref()?.pid
    }

    /// Whether a server is currently connected.
    pub async fn is_connected(&self, id: &str) -> bool {
        let servers = self.servers.read().await;
        servers
            .get(id)
            .is_some_and(|s| s.connection.is_some())
    }

    /// List every cached tool across all connected servers.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let servers = self.servers.read().await;
        servers
            .values()
            .filter_map(|s| s.connection.as_ref())
            .flat_map(|c| c.catalog.tools.clone())
            .collect()
    }

    /// Call a tool on a connected server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ServerNotRunning`] if not connected, or a
    /// [`McpError::ToolCallFailed`] if the call itself fails.
    pub async fn call_tool(&self, server: &str, tool: &str, args: Value) -> McpResult<ToolResult> {
        let args_object = match args {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            },
        };

        let servers = self.servers.read().await;
        let state = servers
            .get(server)
            .ok_or_else(|| McpError::ServerNotFound {
                name: server.into(),
            })?;
        let Some(Peer::Running(peer)) = &state.peer else {
            return Err(McpError::ServerNotRunning {
                name: server.into(),
            });
        };

        let result = peer
            .call_tool(CallToolRequestParams {
                meta: None,
                name: Cow::Owned(tool.to_string()),
                arguments: args_object,
                task: None,
            })
            .await
            .map_err(|e| McpError::ToolCallFailed {
                server: server.to_string(),
                tool: tool.to_string(),
                reason: e.to_string(),
            })?;

        Ok(ToolResult::from(result))
    }

    /// List cached resources for a connected server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ServerNotRunning`] if not connected.
    pub async fn list_resources(&self, server: &str) -> McpResult<Vec<ResourceDefinition>> {
        let servers = self.servers.read().await;
        let state = servers
            .get(server)
            .ok_or_else(|| McpError::ServerNotFound {
                name: server.into(),
            })?;
        Ok(state
            .connection
            .as_ref()
            .map(|c| c.catalog.resources.clone())
            .unwrap_or_default())
    }

    /// Read a resource from a connected server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ServerNotRunning`] if not connected, or a
    /// [`McpError::ToolCallFailed`] if the read itself fails.
    pub async fn read_resource(&self, server: &str, uri: &str) -> McpResult<Vec<ResourceContent>> {
        let servers = self.servers.read().await;
        let state = servers
            .get(server)
            .ok_or_else(|| McpError::ServerNotFound {
                name: server.into(),
            })?;
        let Some(Peer::Running(peer)) = &state.peer else {
            return Err(McpError::ServerNotRunning {
                name: server.into(),
            });
        };

        let result = peer
            .read_resource(ReadResourceRequestParams {
                meta: None,
                uri: uri.to_string(),
            })
            .await
            .map_err(|e| McpError::ToolCallFailed {
                server: server.to_string(),
                tool: "readResource".to_string(),
                reason: e.to_string(),
            })?;

        Ok(result.contents.iter().map(ResourceContent::from_rmcp).collect())
    }

    /// Fetch a prompt from a connected server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ServerNotRunning`] if not connected, or a
    /// [`McpError::ToolCallFailed`] if the call itself fails.
    pub async fn get_prompt(
        &self,
        server: &str,
        name: &str,
        args: Option<serde_json::Map<String, Value>>,
    ) -> McpResult<PromptContent> {
        let servers = self.servers.read().await;
        let state = servers
            .get(server)
            .ok_or_else(|| McpError::ServerNotFound {
                name: server.into(),
            })?;
        let Some(Peer::Running(peer)) = &state.peer else {
            return Err(McpError::ServerNotRunning {
                name: server.into(),
            });
        };

        let result = peer
            .get_prompt(GetPromptRequestParams {
                meta: None,
                name: name.to_string(),
                arguments: args,
            })
            .await
            .map_err(|e| McpError::ToolCallFailed {
                server: server.to_string(),
                tool: name.to_string(),
                reason: e.to_string(),
            })?;

        Ok(PromptContent::from_rmcp(&result))
    }

    /// List prompt definitions cached for a connected server.
    ///
    /// # Errors
    ///
    /// Returns [`McpError::ServerNotFound`] if unregistered.
    pub async fn list_prompts(&self, server: &str) -> McpResult<Vec<PromptDefinition>> {
        let servers = self.servers.read().await;
        let state = servers
            .get(server)
            .ok_or_else(|| McpError::ServerNotFound {
                name: server.into(),
            })?;
        Ok(state
            .connection
            .as_ref()
            .map(|c| c.catalog.prompts.clone())
            .unwrap_or_default())
    }

    /// Reconcile orphaned container-backed connections left over from a
    /// previous Harbor process (§4.3). Stops any tagged containers found
    /// running and does not attempt to re-attach their stdio pipes — a
    /// fresh [`connect`](Self::connect) is always required afterward.
    ///
    /// This default implementation has no container runtime to query and
    /// is a no-op; it exists as the extension point a Docker-backed
    /// runtime integration overrides.
    pub async fn reconcile_orphans(&self) {
        info!("no container runtime configured, skipping orphan reconciliation");
    }
}

/// Minimal `rmcp::ClientHandler` for Harbor connections.
///
/// Harbor does not implement the MCP spec's sampling/roots/elicitation
/// extensions (out of scope), so every server-initiated request besides
/// `get_info` falls back to the trait's default (declining) behavior.
struct HarborClientHandler {
    server_id: String,
}

impl rmcp::ClientHandler for HarborClientHandler {
    fn get_info(&self) -> rmcp::model::ClientInfo {
        rmcp::model::ClientInfo {
            meta: None,
            protocol_version: serde_json::from_value(serde_json::json!("2024-11-05"))
                .expect("valid protocol version"),
            capabilities: rmcp::model::ClientCapabilities::default(),
            client_info: rmcp::model::Implementation {
                name: "harbor".to_string(),
                title: Some(format!("Harbor Agent Runtime Bridge ({})", self.server_id)),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: None,
                icons: None,
                website_url: None,
            },
        }
    }
}

impl HarborClientHandler {
    fn new(server_id: impl Into<String>) -> Self {
        Self {
            server_id: server_id.into(),
        }
    }
}

async fn spawn_peer(
    config: &ServerConfig,
    kind: ConnectionKind,
) -> Result<(RunningService<RoleClient, HarborClientHandler>, Option<u32>), anyhow::Error> {
    match kind {
        ConnectionKind::Http => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("http server {} has no url", config.id))?;
            let transport = StreamableHttpClientTransport::from_uri(url);
            let handler = HarborClientHandler::new(config.id.clone());
            let service = handler.serve(transport).await?;
            Ok((service, None))
        },
        ConnectionKind::Sse => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("sse server {} has no url", config.id))?;
            let transport = SseClientTransport::start(Arc::<str>::from(url.as_str())).await?;
            let handler = HarborClientHandler::new(config.id.clone());
            let service = handler.serve(transport).await?;
            Ok((service, None))
        },
        ConnectionKind::StdioDirect => {
            let command = config
                .command
                .clone()
                .ok_or_else(|| anyhow::anyhow!("stdio server {} has no command", config.id))?;
            let args = config.args.clone();
            spawn_stdio_peer(config, &command, &args).await
        },
        ConnectionKind::StdioIsolated => {
            // Spawn ourselves back into `--mcp-runner <id>` rather than the
            // configured command directly: the runner child execs the real
            // server in place (harbor-cli's runner module), so a crash in
            // the server never takes the supervisor's own process with it.
            let runner = std::env::current_exe()
                .map_err(|e| anyhow::anyhow!("cannot resolve current executable: {e}"))?;
            let runner = runner
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("current executable path is not valid UTF-8"))?
                .to_string();
            let args = vec!["--mcp-runner".to_string(), config.id.clone()];
            spawn_stdio_peer(config, &runner, &args).await
        },
    }
}

/// Spawn `command` (with `args`) over stdio and complete the MCP
/// handshake. Shared by direct mode (the server's own command) and
/// isolated mode (the `--mcp-runner` launcher), which differ only in
/// which command is spawned.
async fn spawn_stdio_peer(
    config: &ServerConfig,
    command: &str,
    args: &[String],
) -> Result<(RunningService<RoleClient, HarborClientHandler>, Option<u32>), anyhow::Error> {
    let env = config.env.clone();
    let cwd = config.cwd.clone();

    let transport = TokioChildProcess::new(Command::new(command).configure(|cmd| {
        cmd.args(args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped());
        for (key, value) in &env {
            cmd.env(key, value);
        }
        if let Some(cwd) = &cwd {
            cmd.current_dir(cwd);
        }
    }))?;

    let pid = transport.id();
    let handler = HarborClientHandler::new(config.id.clone());
    let service = handler.serve(transport).await?;
    Ok((service, pid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PackageKind;

    fn bus() -> EventBus {
        EventBus::new()
    }

    #[tokio::test]
    async fn unregistered_server_connect_fails() {
        let supervisor = Arc::new(McpSupervisor::new(bus()));
        let result = supervisor.connect("nonexistent").await;
        assert!(matches!(result, Err(McpError::ServerNotFound { .. })));
    }

    #[tokio::test]
    async fn crash_beyond_limit_quarantines() {
        let supervisor = Arc::new(McpSupervisor::with_isolation(bus(), true));
        supervisor
            .add_server(ServerConfig::npm("flaky", "node").direct())
            .await;

        // Manufacture a connection record so crash_count has somewhere to live.
        {
            let mut servers = supervisor.servers.write().await;
            let state = servers.get_mut("flaky").unwrap();
            state.connection = Some(Connection::new("flaky", ConnectionKind::StdioDirect, Some(1)));
        }

        for attempt in 1..=3 {
            let result = supervisor.record_crash("flaky", Some(1)).await;
            assert!(result.is_ok(), "attempt {attempt} should not quarantine yet");
        }

        let result = supervisor.record_crash("flaky", Some(1)).await;
        assert!(matches!(result, Err(McpError::ServerQuarantined { .. })));

        let connect_result = supervisor.connect("flaky").await;
        assert!(matches!(
            connect_result,
            Err(McpError::ServerQuarantined { .. })
        ));
    }

    #[tokio::test]
    async fn stderr_tail_reflects_recorded_lines() {
        let supervisor = Arc::new(McpSupervisor::new(bus()));
        supervisor.add_server(ServerConfig::npm("fs", "node")).await;
        {
            let mut servers = supervisor.servers.write().await;
            let state = servers.get_mut("fs").unwrap();
            state.connection = Some(Connection::new("fs", ConnectionKind::StdioIsolated, Some(1)));
        }
        supervisor.record_stderr("fs", "booting up").await;
        supervisor.record_stderr("fs", "ready").await;

        let tail = supervisor.stderr_tail("fs").await;
        assert_eq!(tail, vec!["booting up", "ready"]);
    }

    #[test]
    fn connection_kind_respects_isolation_toggle() {
        let supervisor_off = McpSupervisor::with_isolation(bus(), false);
        let supervisor_on = McpSupervisor::with_isolation(bus(), true);
        let config = ServerConfig::npm("fs", "node");

        assert_eq!(
            supervisor_off.connection_kind(&config),
            ConnectionKind::StdioDirect
        );
        assert_eq!(
            supervisor_on.connection_kind(&config),
            ConnectionKind::StdioIsolated
        );

        let remote = ServerConfig::remote("remote", PackageKind::Sse, "https://x.test");
        assert_eq!(supervisor_on.connection_kind(&remote), ConnectionKind::Sse);
    }
}
