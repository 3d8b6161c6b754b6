//! The Policy Kernel's grant table (§4.2): the authorization oracle the
//! Host Facade consults before every gated operation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use harbor_core::{Origin, Scope};
use tracing::{debug, warn};

use crate::error::{PolicyError, PolicyResult};
use crate::grant::{Grant, GrantId, GrantMode};

/// Outcome of a [`GrantStore::record`] call, for the kernel's observability
/// counters (module overview: "observability counters").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// The check was granted.
    Allowed,
    /// The check was denied, for any reason.
    Denied,
}

/// A grant table persisted to a JSON file on disk, holding every
/// `Always`/`Denied` grant so they survive process restart (§3: "destroyed
/// on revoke, tab close ... or process restart (for once)" implies
/// non-once grants outlive a restart). `Once` grants are never persisted;
/// they are in-memory-only and consumed or time out within one run.
pub struct GrantStore {
    grants: RwLock<Vec<Grant>>,
    /// Simple (origin, scope) allow/deny observability counters.
    counters: RwLock<HashMap<(Origin, &'static str, &'static str), u64>>,
    persist_path: Option<PathBuf>,
}

impl GrantStore {
    /// Create an in-memory-only store (no persistence).
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            grants: RwLock::new(Vec::new()),
            counters: RwLock::new(HashMap::new()),
            persist_path: None,
        }
    }

    /// Create a store that persists `Always`/`Denied` grants to a JSON
    /// file, loading any that already exist there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn with_persistence(path: impl AsRef<Path>) -> PolicyResult<Self> {
        let path = path.as_ref().to_path_buf();
        let grants = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| PolicyError::Internal(format!("corrupt grant store: {e}")))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(PolicyError::Internal(format!("reading grant store: {e}"))),
        };

        Ok(Self {
            grants: RwLock::new(grants),
            counters: RwLock::new(HashMap::new()),
            persist_path: Some(path),
        })
    }

    fn persist_locked(&self, grants: &[Grant]) -> PolicyResult<()> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        let durable: Vec<&Grant> = grants.iter().filter(|g| g.mode != GrantMode::Once).collect();
        let bytes = serde_json::to_vec_pretty(&durable)
            .map_err(|e| PolicyError::Internal(format!("serializing grant store: {e}")))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| PolicyError::Internal(format!("creating grant store dir: {e}")))?;
        }
        fs::write(path, bytes)
            .map_err(|e| PolicyError::Internal(format!("writing grant store: {e}")))
    }

    /// Store a new grant, replacing any other grant with the same
    /// (origin, scope, `tab_id`) tuple it would otherwise collide with.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence is enabled and the write fails.
    pub fn grant(&self, grant: Grant) -> PolicyResult<GrantId> {
        let id = grant.id;
        let mut grants = self
            .grants
            .write()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;

        grants.retain(|g| {
            !(g.origin == grant.origin && g.scope == grant.scope && g.tab_id == grant.tab_id)
        });
        grants.push(grant);
        self.persist_locked(&grants)?;
        Ok(id)
    }

    /// Remove every grant for (origin, scope), regardless of mode or
    /// tab-scoping.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence is enabled and the write fails.
    pub fn revoke(&self, origin: &Origin, scope: Scope) -> PolicyResult<()> {
        let mut grants = self
            .grants
            .write()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;
        grants.retain(|g| !(&g.origin == origin && g.scope == scope));
        self.persist_locked(&grants)
    }

    /// Drop every tab-scoped grant for `tab_id` (§3: "A Permission Grant
    /// with tab-id MUST expire when that tab closes").
    ///
    /// # Errors
    ///
    /// Returns an error if persistence is enabled and the write fails.
    pub fn expire_tab_grants(&self, tab_id: &str) -> PolicyResult<()> {
        let mut grants = self
            .grants
            .write()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;
        grants.retain(|g| g.tab_id.as_deref() != Some(tab_id));
        self.persist_locked(&grants)
    }

    /// Check whether `origin` holds `scope`, applying the resolution
    /// precedence from §4.2: explicit deny > tab-scoped always-allow >
    /// origin-wide always-allow > once > absent. Expired grants (including
    /// a timed-out once-grant) are treated as absent and swept out.
    ///
    /// On a `Once` grant matching, it is consumed: removed from the table
    /// so a second call for the same (origin, scope) finds nothing.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::PermissionDenied`] for an explicit deny or no
    /// match, or [`PolicyError::ScopeRequired`] if no grant exists at all
    /// (so the caller can distinguish "ask the user" from "the user said
    /// no").
    pub fn check(&self, origin: &Origin, scope: Scope, tab_id: Option<&str>) -> PolicyResult<()> {
        let mut grants = self
            .grants
            .write()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;

        let before = grants.len();
        grants.retain(|g| !(g.origin == *origin && g.scope == scope && g.is_expired()));
        if grants.len() != before {
            self.persist_locked(&grants)?;
        }

        let matching: Vec<&Grant> = grants
            .iter()
            .filter(|g| g.origin == *origin && g.scope == scope)
            .collect();

        if matching.iter().any(|g| g.mode == GrantMode::Denied) {
            return Err(PolicyError::PermissionDenied {
                origin: origin.as_str().to_string(),
                scope: scope.as_str().to_string(),
            });
        }

        let tab_scoped_always = matching.iter().any(|g| {
            g.mode == GrantMode::Always && g.tab_id.is_some() && g.tab_id.as_deref() == tab_id
        });
        if tab_scoped_always {
            return Ok(());
        }

        let origin_wide_always = matching
            .iter()
            .any(|g| g.mode == GrantMode::Always && g.tab_id.is_none());
        if origin_wide_always {
            return Ok(());
        }

        if let Some(pos) = matching.iter().position(|g| g.mode == GrantMode::Once) {
            let id = matching[pos].id;
            drop(matching);
            grants.retain(|g| g.id != id);
            self.persist_locked(&grants)?;
            return Ok(());
        }

        Err(PolicyError::ScopeRequired {
            origin: origin.as_str().to_string(),
            scope: scope.as_str().to_string(),
        })
    }

    /// Check whether `origin` may call `tool`, given an optional
    /// server-level allowlist. Requires a standing `mcp:tools.call` grant
    /// via [`GrantStore::check`] first.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::ToolNotAllowed`] if a grant exists but
    /// excludes `tool`, or propagates [`GrantStore::check`]'s errors.
    pub fn check_tool(
        &self,
        origin: &Origin,
        tab_id: Option<&str>,
        tool: &str,
        server_allowlist: Option<&[String]>,
    ) -> PolicyResult<()> {
        self.check(origin, Scope::McpToolsCall, tab_id)?;

        let grants = self
            .grants
            .read()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;
        let covered = grants
            .iter()
            .filter(|g| g.origin == *origin && g.scope == Scope::McpToolsCall)
            .any(|g| g.allows_tool(tool, server_allowlist));

        if covered {
            Ok(())
        } else {
            Err(PolicyError::ToolNotAllowed {
                origin: origin.as_str().to_string(),
                tool: tool.to_string(),
            })
        }
    }

    /// Record an observability counter for a policy decision. Distinct
    /// from `harbor-audit`'s chain-linked ledger, which the Host Facade
    /// writes per-operation (§4.6); this is the kernel's own lightweight
    /// counter table (module overview: "observability counters").
    pub fn record(&self, origin: &Origin, scope: Scope, outcome: PolicyOutcome) {
        let label = match outcome {
            PolicyOutcome::Allowed => "allowed",
            PolicyOutcome::Denied => "denied",
        };
        let mut counters = self.counters.write().unwrap_or_else(|e| e.into_inner());
        *counters
            .entry((origin.clone(), scope.as_str(), label))
            .or_insert(0) += 1;
        debug!(%origin, %scope, outcome = label, "policy decision recorded");
    }

    /// Current value of the (origin, scope, outcome) counter, for tests
    /// and diagnostics.
    #[must_use]
    pub fn counter(&self, origin: &Origin, scope: Scope, outcome: PolicyOutcome) -> u64 {
        let label = match outcome {
            PolicyOutcome::Allowed => "allowed",
            PolicyOutcome::Denied => "denied",
        };
        self.counters
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(origin.clone(), scope.as_str(), label))
            .copied()
            .unwrap_or(0)
    }

    /// List every non-expired grant held by `origin`, for the Host
    /// Facade's `listGrants` operation (§4.6).
    ///
    /// # Errors
    ///
    /// Returns an error only if the internal lock is poisoned.
    pub fn list(&self, origin: &Origin) -> PolicyResult<Vec<Grant>> {
        let grants = self
            .grants
            .read()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;
        Ok(grants
            .iter()
            .filter(|g| &g.origin == origin && !g.is_expired())
            .cloned()
            .collect())
    }

    /// Remove every expired grant across all origins and scopes. Intended
    /// to run periodically so a long-lived process does not accumulate
    /// timed-out once-grants.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence is enabled and the write fails.
    pub fn sweep_expired(&self) -> PolicyResult<usize> {
        let mut grants = self
            .grants
            .write()
            .map_err(|e| PolicyError::Internal(e.to_string()))?;
        let before = grants.len();
        grants.retain(|g| !g.is_expired());
        let removed = before.saturating_sub(grants.len());
        if removed > 0 {
            warn!(removed, "swept expired grants");
            self.persist_locked(&grants)?;
        }
        Ok(removed)
    }
}

impl Default for GrantStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Origin {
        Origin::new("https://x.test").unwrap()
    }

    #[test]
    fn absent_grant_requires_scope() {
        let store = GrantStore::in_memory();
        assert!(matches!(
            store.check(&origin(), Scope::McpToolsList, None),
            Err(PolicyError::ScopeRequired { .. })
        ));
    }

    #[test]
    fn always_grant_is_reusable() {
        let store = GrantStore::in_memory();
        store.grant(Grant::always(origin(), Scope::ChatOpen)).unwrap();
        assert!(store.check(&origin(), Scope::ChatOpen, None).is_ok());
        assert!(store.check(&origin(), Scope::ChatOpen, None).is_ok());
    }

    #[test]
    fn once_grant_is_consumed_after_first_use() {
        let store = GrantStore::in_memory();
        store.grant(Grant::once(origin(), Scope::McpToolsList)).unwrap();
        assert!(store.check(&origin(), Scope::McpToolsList, None).is_ok());
        assert!(matches!(
            store.check(&origin(), Scope::McpToolsList, None),
            Err(PolicyError::ScopeRequired { .. })
        ));
    }

    #[test]
    fn explicit_deny_wins_over_always_allow() {
        let store = GrantStore::in_memory();
        store.grant(Grant::always(origin(), Scope::WebFetch)).unwrap();
        store.grant(Grant::deny(origin(), Scope::WebFetch)).unwrap();
        assert!(matches!(
            store.check(&origin(), Scope::WebFetch, None),
            Err(PolicyError::PermissionDenied { .. })
        ));
    }

    #[test]
    fn tab_scoped_grant_expires_with_the_tab() {
        let store = GrantStore::in_memory();
        store
            .grant(Grant::always(origin(), Scope::BrowserActiveTabRead).with_tab("tab-1"))
            .unwrap();
        assert!(store
            .check(&origin(), Scope::BrowserActiveTabRead, Some("tab-1"))
            .is_ok());

        store.expire_tab_grants("tab-1").unwrap();
        assert!(matches!(
            store.check(&origin(), Scope::BrowserActiveTabRead, Some("tab-1")),
            Err(PolicyError::ScopeRequired { .. })
        ));
    }

    #[test]
    fn revoke_removes_every_grant_for_the_pair() {
        let store = GrantStore::in_memory();
        store.grant(Grant::always(origin(), Scope::ChatOpen)).unwrap();
        store.revoke(&origin(), Scope::ChatOpen).unwrap();
        assert!(matches!(
            store.check(&origin(), Scope::ChatOpen, None),
            Err(PolicyError::ScopeRequired { .. })
        ));
    }

    #[test]
    fn check_tool_enforces_grant_and_server_allowlist_intersection() {
        let store = GrantStore::in_memory();
        store
            .grant(
                Grant::always(origin(), Scope::McpToolsCall)
                    .with_allowed_tools(["read_file".to_string()]),
            )
            .unwrap();

        let server_allowlist = vec!["read_file".to_string(), "write_file".to_string()];
        assert!(store
            .check_tool(&origin(), None, "read_file", Some(&server_allowlist))
            .is_ok());
        assert!(matches!(
            store.check_tool(&origin(), None, "write_file", Some(&server_allowlist)),
            Err(PolicyError::ToolNotAllowed { .. })
        ));
    }

    #[test]
    fn persistence_survives_store_reconstruction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grants.json");

        {
            let store = GrantStore::with_persistence(&path).unwrap();
            store.grant(Grant::always(origin(), Scope::ChatOpen)).unwrap();
            store.grant(Grant::once(origin(), Scope::McpToolsList)).unwrap();
        }

        let reopened = GrantStore::with_persistence(&path).unwrap();
        assert!(reopened.check(&origin(), Scope::ChatOpen, None).is_ok());
        // Once-grants are never persisted.
        assert!(matches!(
            reopened.check(&origin(), Scope::McpToolsList, None),
            Err(PolicyError::ScopeRequired { .. })
        ));
    }

    #[test]
    fn record_increments_the_named_counter() {
        let store = GrantStore::in_memory();
        store.record(&origin(), Scope::ChatOpen, PolicyOutcome::Allowed);
        store.record(&origin(), Scope::ChatOpen, PolicyOutcome::Allowed);
        store.record(&origin(), Scope::ChatOpen, PolicyOutcome::Denied);

        assert_eq!(store.counter(&origin(), Scope::ChatOpen, PolicyOutcome::Allowed), 2);
        assert_eq!(store.counter(&origin(), Scope::ChatOpen, PolicyOutcome::Denied), 1);
    }
}
