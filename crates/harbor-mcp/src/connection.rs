//! A single live connection to an MCP server (§3, §4.3).

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::types::{PromptDefinition, ResourceDefinition, ToolDefinition};

/// How a [`Connection`] reaches its server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// Stdio transport, server spawned directly in this process tree.
    StdioDirect,
    /// Stdio transport, server spawned by an isolated runner child; only
    /// the runner is lost if the server crashes.
    StdioIsolated,
    /// Remote server reachable over HTTP.
    Http,
    /// Remote server reachable over HTTP with Server-Sent Events.
    Sse,
}

impl ConnectionKind {
    /// Whether this connection has an OS process backing it (stdio
    /// variants) as opposed to a bare network client (http/sse).
    #[must_use]
    pub fn is_process_backed(self) -> bool {
        matches!(self, Self::StdioDirect | Self::StdioIsolated)
    }
}

/// Maximum number of stderr lines retained per connection.
pub const STDERR_RING_CAPACITY: usize = 200;

/// Bounded FIFO of a server process's recent stderr output, used for
/// crash diagnostics surfaced to the extension (§4.3).
#[derive(Debug, Clone, Default)]
pub struct StderrRing {
    lines: VecDeque<String>,
    capacity: usize,
}

impl StderrRing {
    /// Create an empty ring with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(STDERR_RING_CAPACITY)
    }

    /// Create an empty ring with an explicit capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, evicting the oldest if at capacity.
    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// The retained lines, oldest first.
    #[must_use]
    pub fn tail(&self) -> Vec<&str> {
        self.lines.iter().map(String::as_str).collect()
    }

    /// Number of lines currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no lines have been retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cached descriptors from a server's most recent successful `initialize`
/// + `list*` round trip.
#[derive(Debug, Clone, Default)]
pub struct ConnectionCatalog {
    /// Cached tool list.
    pub tools: Vec<ToolDefinition>,
    /// Cached resource list.
    pub resources: Vec<ResourceDefinition>,
    /// Cached prompt list.
    pub prompts: Vec<PromptDefinition>,
}

/// A live connection to one Installed Server (§3).
#[derive(Debug, Clone)]
pub struct Connection {
    /// The Installed Server id this connection belongs to.
    pub server_id: String,
    /// How this connection reaches the server.
    pub kind: ConnectionKind,
    /// OS pid of the spawned process, if any (the server's own pid for
    /// `StdioDirect`, the runner child's pid for `StdioIsolated`).
    pub pid: Option<u32>,
    /// Recent stderr output, for diagnostics.
    pub stderr: StderrRing,
    /// Cached tool/resource/prompt descriptors.
    pub catalog: ConnectionCatalog,
    /// When this connection was established.
    pub connected_at: DateTime<Utc>,
    /// Number of crashes observed for this server within the current
    /// restart window.
    pub crash_count: u32,
}

impl Connection {
    /// Record a fresh connection with an empty catalog.
    #[must_use]
    pub fn new(server_id: impl Into<String>, kind: ConnectionKind, pid: Option<u32>) -> Self {
        Self {
            server_id: server_id.into(),
            kind,
            pid,
            stderr: StderrRing::new(),
            catalog: ConnectionCatalog::default(),
            connected_at: Utc::now(),
            crash_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_evicts_oldest_past_capacity() {
        let mut ring = StderrRing::with_capacity(3);
        ring.push("a");
        ring.push("b");
        ring.push("c");
        ring.push("d");

        assert_eq!(ring.tail(), vec!["b", "c", "d"]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn empty_ring_reports_empty() {
        let ring = StderrRing::new();
        assert!(ring.is_empty());
        assert!(ring.tail().is_empty());
    }

    #[test]
    fn process_backed_distinguishes_stdio_from_remote() {
        assert!(ConnectionKind::StdioDirect.is_process_backed());
        assert!(ConnectionKind::StdioIsolated.is_process_backed());
        assert!(!ConnectionKind::Http.is_process_backed());
        assert!(!ConnectionKind::Sse.is_process_backed());
    }

    #[test]
    fn new_connection_starts_with_zero_crashes_and_empty_catalog() {
        let conn = Connection::new("fs", ConnectionKind::StdioIsolated, Some(1234));
        assert_eq!(conn.crash_count, 0);
        assert!(conn.catalog.tools.is_empty());
        assert_eq!(conn.pid, Some(1234));
    }
}
