//! Types shared by every Harbor subsystem: [`Timestamp`], [`SessionId`],
//! [`Origin`], and [`Scope`] (§3 Data Model).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A point in time, serialized as RFC 3339 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wrap an existing `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// The wrapped `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whether this timestamp is at least `duration` in the past relative to `now`.
    #[must_use]
    pub fn is_older_than(&self, duration: chrono::Duration, now: Timestamp) -> bool {
        now.0 - self.0 >= duration
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Unique identifier for a chat session, stable across resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Mint a fresh random session id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID (e.g. recovered from a session file name).
    #[must_use]
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The wrapped UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The origin a request arrived from — an extension id, a tab's page origin,
/// or another trust boundary the Policy Kernel grants scopes against. Opaque
/// and compared by exact string equality; Harbor does not parse or validate
/// origin syntax beyond non-emptiness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    /// Wrap a raw origin string.
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is empty.
    pub fn new(raw: impl Into<String>) -> Result<Self, OriginError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(OriginError::Empty);
        }
        Ok(Self(raw))
    }

    /// The underlying origin string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error constructing an [`Origin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OriginError {
    /// The origin string was empty.
    #[error("origin must not be empty")]
    Empty,
}

/// The fixed set of permission scopes the Policy Kernel understands (§4.2).
///
/// This set is closed: adding a new capability to Harbor means adding a new
/// variant here, not accepting an arbitrary string, so every call site that
/// matches on [`Scope`] stays exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Send a prompt to the active LLM provider.
    #[serde(rename = "model:prompt")]
    ModelPrompt,
    /// Let the LLM see and invoke a tool set.
    #[serde(rename = "model:tools")]
    ModelTools,
    /// List tools exposed by connected MCP servers.
    #[serde(rename = "mcp:tools.list")]
    McpToolsList,
    /// Call an MCP tool.
    #[serde(rename = "mcp:tools.call")]
    McpToolsCall,
    /// Read the active browser tab.
    #[serde(rename = "browser:activeTab.read")]
    BrowserActiveTabRead,
    /// Register a new MCP server.
    #[serde(rename = "mcp:servers.register")]
    McpServersRegister,
    /// Open a chat session.
    #[serde(rename = "chat:open")]
    ChatOpen,
    /// Perform an outbound web fetch on behalf of a tool.
    #[serde(rename = "web:fetch")]
    WebFetch,
}

impl Scope {
    /// The canonical wire string for this scope, as used in `servers.json`
    /// allowlists and grant records.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ModelPrompt => "model:prompt",
            Self::ModelTools => "model:tools",
            Self::McpToolsList => "mcp:tools.list",
            Self::McpToolsCall => "mcp:tools.call",
            Self::BrowserActiveTabRead => "browser:activeTab.read",
            Self::McpServersRegister => "mcp:servers.register",
            Self::ChatOpen => "chat:open",
            Self::WebFetch => "web:fetch",
        }
    }

    /// All scopes, for iteration (e.g. building a default-deny grant table).
    #[must_use]
    pub fn all() -> [Scope; 8] {
        [
            Self::ModelPrompt,
            Self::ModelTools,
            Self::McpToolsList,
            Self::McpToolsCall,
            Self::BrowserActiveTabRead,
            Self::McpServersRegister,
            Self::ChatOpen,
            Self::WebFetch,
        ]
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
