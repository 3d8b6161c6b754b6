//! Permission grants — the unit of per-origin authorization (§3, §4.2).
//!
//! A [`Grant`] replaces the signed `CapabilityToken` this crate started
//! from: origins are not cryptographic principals here (the extension
//! brokers every request, the core never talks to a page directly), so a
//! grant is a plain stored decision rather than something the holder must
//! present and prove possession of.

use chrono::Duration;
use harbor_core::{Origin, Scope, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Once-grants are consumed on first use or expire after this long,
/// whichever comes first (§4.2).
pub const ONCE_GRANT_TTL_SECS: i64 = 10 * 60;

/// Unique identifier for a stored grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrantId(pub Uuid);

impl GrantId {
    /// Create a new, random grant id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GrantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GrantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "grant:{}", &self.0.to_string()[..8])
    }
}

/// How strongly a grant authorizes its (origin, scope) pair.
///
/// Resolution precedence when more than one grant matches a check is
/// `Denied > Always` (tab-scoped variants of `Always` win over
/// origin-wide ones) `> Once` (§4.2). `GrantStore::check` implements the
/// full ordering; this enum only carries the mode itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantMode {
    /// Valid for exactly one matching check, then consumed.
    Once,
    /// Valid until revoked, the tab closes (if tab-scoped), or it expires.
    Always,
    /// Explicit denial; always wins over an `Always` or `Once` grant for
    /// the same (origin, scope).
    Denied,
}

/// A stored authorization decision for one (origin, scope) pair (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grant {
    /// Unique identifier.
    pub id: GrantId,
    /// Origin this grant applies to.
    pub origin: Origin,
    /// Scope this grant covers.
    pub scope: Scope,
    /// Allow-once / allow-always / deny.
    pub mode: GrantMode,
    /// If set, this grant only applies while the named browser tab is
    /// open, and is destroyed when that tab closes.
    pub tab_id: Option<String>,
    /// If set, restricts `mcp:tools.call` to these tool names. Intersected
    /// with any server-level allowlist at call time (§4.2).
    pub allowed_tools: Option<Vec<String>>,
    /// When the grant was created.
    pub issued_at: Timestamp,
    /// When the grant stops applying, if it has a fixed lifetime.
    pub expires_at: Option<Timestamp>,
}

impl Grant {
    /// Create an always-allow grant with no expiry, tab-scoping, or
    /// tool-allowlist restriction.
    #[must_use]
    pub fn always(origin: Origin, scope: Scope) -> Self {
        Self {
            id: GrantId::new(),
            origin,
            scope,
            mode: GrantMode::Always,
            tab_id: None,
            allowed_tools: None,
            issued_at: Timestamp::now(),
            expires_at: None,
        }
    }

    /// Create a once-grant, consumed on first matching use or expiring
    /// after [`ONCE_GRANT_TTL_SECS`].
    #[must_use]
    pub fn once(origin: Origin, scope: Scope) -> Self {
        #[allow(clippy::arithmetic_side_effects)]
        let expires_at = Timestamp::from_datetime(
            Timestamp::now().as_datetime() + Duration::seconds(ONCE_GRANT_TTL_SECS),
        );
        Self {
            id: GrantId::new(),
            origin,
            scope,
            mode: GrantMode::Once,
            tab_id: None,
            allowed_tools: None,
            issued_at: Timestamp::now(),
            expires_at: Some(expires_at),
        }
    }

    /// Create an explicit deny grant, overriding any `Always`/`Once` grant
    /// for the same (origin, scope).
    #[must_use]
    pub fn deny(origin: Origin, scope: Scope) -> Self {
        Self {
            id: GrantId::new(),
            origin,
            scope,
            mode: GrantMode::Denied,
            tab_id: None,
            allowed_tools: None,
            issued_at: Timestamp::now(),
            expires_at: None,
        }
    }

    /// Scope this grant to a single browser tab; it is destroyed when
    /// that tab closes (§3).
    #[must_use]
    pub fn with_tab(mut self, tab_id: impl Into<String>) -> Self {
        self.tab_id = Some(tab_id.into());
        self
    }

    /// Restrict this grant's `mcp:tools.call` coverage to a fixed set of
    /// tool names.
    #[must_use]
    pub fn with_allowed_tools(mut self, tools: impl IntoIterator<Item = String>) -> Self {
        self.allowed_tools = Some(tools.into_iter().collect());
        self
    }

    /// Set an explicit expiry, overriding the default for the chosen mode.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Whether this grant's fixed lifetime (if any) has elapsed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .as_ref()
            .is_some_and(|exp| Timestamp::now().as_datetime() > exp.as_datetime())
    }

    /// Whether this grant covers `tool`, accounting for an optional
    /// server-level allowlist that must be intersected with this grant's
    /// own allowlist (§4.2: "A tool-allowlist on a grant MUST be
    /// intersected with any server-level restriction").
    #[must_use]
    pub fn allows_tool(&self, tool: &str, server_allowlist: Option<&[String]>) -> bool {
        let grant_ok = self
            .allowed_tools
            .as_ref()
            .is_none_or(|tools| tools.iter().any(|t| t == tool));
        let server_ok = server_allowlist.is_none_or(|tools| tools.iter().any(|t| t == tool));
        grant_ok && server_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::new("https://x.test").unwrap()
    }

    #[test]
    fn once_grant_expires_after_ttl() {
        let grant = Grant::once(origin(), Scope::McpToolsCall);
        assert!(!grant.is_expired());
        assert_eq!(grant.mode, GrantMode::Once);
        assert!(grant.expires_at.is_some());
    }

    #[test]
    fn always_grant_has_no_default_expiry() {
        let grant = Grant::always(origin(), Scope::ChatOpen);
        assert!(grant.expires_at.is_none());
        assert!(!grant.is_expired());
    }

    #[test]
    fn tab_scoping_is_recorded() {
        let grant = Grant::always(origin(), Scope::BrowserActiveTabRead).with_tab("tab-7");
        assert_eq!(grant.tab_id.as_deref(), Some("tab-7"));
    }

    #[test]
    fn allows_tool_intersects_grant_and_server_allowlists() {
        let grant = Grant::always(origin(), Scope::McpToolsCall)
            .with_allowed_tools(["read_file".to_string(), "list_dir".to_string()]);

        let server_allowlist = vec!["read_file".to_string(), "write_file".to_string()];

        assert!(grant.allows_tool("read_file", Some(&server_allowlist)));
        assert!(!grant.allows_tool("list_dir", Some(&server_allowlist)));
        assert!(!grant.allows_tool("write_file", Some(&server_allowlist)));
        assert!(grant.allows_tool("read_file", None));
    }

    #[test]
    fn no_allowlist_on_either_side_allows_anything() {
        let grant = Grant::always(origin(), Scope::McpToolsCall);
        assert!(grant.allows_tool("anything", None));
    }
}
