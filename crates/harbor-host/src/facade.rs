//! The Host Facade (§4.6): the per-origin surface that binds Policy ×
//! MCP × LLM and is invoked, via [`crate::dispatch`], over the Transport
//! frame stream.
//!
//! Every method here emits a structured audit record through
//! `harbor-audit` before returning, success or failure, per §4.6's
//! literal requirement. Grant checks additionally feed the Policy
//! Kernel's own lightweight `record` counters, which are a distinct,
//! unpersisted observability signal from the audit ledger.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::RwLock;

use harbor_audit::{AuditAction, AuditLog, AuditOutcome, AuthorizationProof};
use harbor_core::{Origin, Scope, SessionId};
use harbor_crypto::ContentHash;
use harbor_events::EventBus;
use harbor_llm::{LlmProvider, LlmToolDefinition, Message};
use harbor_mcp::{McpSupervisor, ToolDefinition};
use harbor_policy::{Grant, GrantStore, PolicyOutcome, RateBudgets};
use harbor_runtime::{CancellationToken, ChatOrchestrator, ChatSession, RunOutcome, SessionStore};
use serde_json::Value;

use crate::error::{HostError, HostResult};
use crate::providers::ProviderRegistry;

/// All subsystem handles the facade binds together, shared across every
/// connected origin.
pub struct HostFacade {
    grants: Arc<GrantStore>,
    budgets: Arc<RateBudgets>,
    mcp: Arc<McpSupervisor>,
    audit: Arc<AuditLog>,
    events: EventBus,
    providers: Arc<ProviderRegistry>,
    sessions: SessionStore,
    /// Sessions currently held in memory, keyed by id. A session is
    /// loaded from `sessions` on first touch and kept here for the
    /// lifetime of the process (§4.6 chat session ops).
    live_sessions: RwLock<HashMap<SessionId, ChatSession>>,
    base_system_prompt: String,
}

impl HostFacade {
    /// Build a facade over the given subsystems.
    #[must_use]
    pub fn new(
        grants: Arc<GrantStore>,
        budgets: Arc<RateBudgets>,
        mcp: Arc<McpSupervisor>,
        audit: Arc<AuditLog>,
        events: EventBus,
        providers: Arc<ProviderRegistry>,
        sessions: SessionStore,
        base_system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            grants,
            budgets,
            mcp,
            audit,
            events,
            providers,
            sessions,
            live_sessions: RwLock::new(HashMap::new()),
            base_system_prompt: base_system_prompt.into(),
        }
    }

    fn audit_permission_op(&self, session_id: SessionId, origin: &Origin, scope: Scope, op: &str, outcome: &Result<(), HostError>) {
        let proof = match outcome {
            Ok(()) => AuthorizationProof::NotRequired { reason: format!("{op} is self-authorizing") },
            Err(e) => AuthorizationProof::Denied { reason: e.to_string() },
        };
        let audit_outcome = match outcome {
            Ok(()) => AuditOutcome::success(),
            Err(e) => AuditOutcome::failure(e.to_string()),
        };
        let action = AuditAction::PermissionOp { origin: origin.as_str().to_string(), scope, op: op.to_string() };
        let _ = self.audit.append(session_id, action, proof, audit_outcome);
    }

    // ---------------------------------------------------------------
    // listTools / callTool
    // ---------------------------------------------------------------

    /// `listTools(origin, serverIds?)` — requires `mcp:tools.list`;
    /// filters to the origin's allowlist.
    pub async fn list_tools(&self, origin: &Origin, server_ids: Option<&[String]>) -> HostResult<Vec<ToolDefinition>> {
        let check = self.grants.check(origin, Scope::McpToolsList, None);
        self.grants.record(origin, Scope::McpToolsList, to_outcome(&check));

        let result: HostResult<Vec<ToolDefinition>> = match check {
            Ok(()) => {
                let all = self.mcp.list_tools().await;
                Ok(match server_ids {
                    Some(ids) => all.into_iter().filter(|t| ids.iter().any(|id| id == &t.server)).collect(),
                    None => all,
                })
            },
            Err(e) => Err(HostError::from(e)),
        };

        let outcome = match &result {
            Ok(tools) => AuditOutcome::success_with(format!("{} tools", tools.len())),
            Err(e) => AuditOutcome::failure(e.to_string()),
        };
        let action = AuditAction::ListTools { origin: origin.as_str().to_string() };
        let proof = AuthorizationProof::Grant { origin: origin.as_str().to_string(), scope: Scope::McpToolsList };
        let _ = self.audit.append(SessionId::new(), action, proof, outcome);

        result
    }

    /// `callTool(origin, toolName, args, {timeoutMs?, runId?})` —
    /// requires `mcp:tools.call`, consumes a budget unit, attaches
    /// provenance `(serverId, toolName, runId, timestamp)`.
    pub async fn call_tool(
        &self,
        origin: &Origin,
        server: &str,
        tool: &str,
        args: Value,
        run_id: Option<String>,
    ) -> HostResult<Value> {
        let full_name = format!("{server}:{tool}");
        let check = self.grants.check_tool(origin, None, &full_name, None);
        self.grants.record(origin, Scope::McpToolsCall, to_outcome(&check));
        check?;

        if !self.budgets.acquire(origin, "mcp:tools.call") {
            let err = HostError::RateLimited { resource: "mcp:tools.call".to_string() };
            self.audit_tool_call(origin, server, tool, &args, run_id, Err(&err));
            return Err(err);
        }

        let result = self.mcp.call_tool(server, tool, args.clone()).await.map_err(HostError::from);
        self.audit_tool_call(origin, server, tool, &args, run_id, result.as_ref().map(|_| ()));
        result.map(|r| Value::String(r.text_content()))
    }

    fn audit_tool_call(&self, origin: &Origin, server: &str, tool: &str, args: &Value, run_id: Option<String>, outcome: Result<(), &HostError>) {
        let args_bytes = serde_json::to_vec(args).unwrap_or_default();
        let action = AuditAction::McpToolCall {
            server: server.to_string(),
            tool: tool.to_string(),
            args_hash: ContentHash::hash(&args_bytes),
            run_id,
        };
        let proof = AuthorizationProof::Grant { origin: origin.as_str().to_string(), scope: Scope::McpToolsCall };
        let audit_outcome = match outcome {
            Ok(()) => AuditOutcome::success(),
            Err(e) => AuditOutcome::failure(e.to_string()),
        };
        let _ = self.audit.append(SessionId::new(), action, proof, audit_outcome);
    }

    // ---------------------------------------------------------------
    // Permission ops
    // ---------------------------------------------------------------

    /// Grant a scope to an origin.
    pub fn grant(&self, origin: &Origin, grant: Grant) -> HostResult<()> {
        let result = self.grants.grant(grant).map(|_| ()).map_err(HostError::from);
        self.audit_permission_op(SessionId::new(), origin, Scope::ChatOpen, "grant", &result);
        result
    }

    /// Revoke a scope from an origin.
    pub fn revoke(&self, origin: &Origin, scope: Scope) -> HostResult<()> {
        let result = self.grants.revoke(origin, scope).map_err(HostError::from);
        self.audit_permission_op(SessionId::new(), origin, scope, "revoke", &result);
        result
    }

    /// Check whether `origin` currently holds `scope`.
    pub fn check(&self, origin: &Origin, scope: Scope, tab_id: Option<&str>) -> HostResult<()> {
        let result = self.grants.check(origin, scope, tab_id).map_err(HostError::from);
        self.grants.record(origin, scope, if result.is_ok() { PolicyOutcome::Allowed } else { PolicyOutcome::Denied });
        self.audit_permission_op(SessionId::new(), origin, scope, "check", &result);
        result
    }

    /// List every non-expired grant held by `origin`.
    pub fn list_grants(&self, origin: &Origin) -> HostResult<Vec<Grant>> {
        let result = self.grants.list(origin).map_err(HostError::from);
        let ok = result.as_ref().map(|_| ()).map_err(|e| HostError::Internal(e.to_string()));
        self.audit_permission_op(SessionId::new(), origin, Scope::ChatOpen, "list", &ok);
        result
    }

    /// Expire every tab-scoped grant for `tab_id` (browser tab closed).
    pub fn expire_tab_grants(&self, origin: &Origin, tab_id: &str) -> HostResult<()> {
        let result = self.grants.expire_tab_grants(tab_id).map_err(HostError::from);
        self.audit_permission_op(SessionId::new(), origin, Scope::BrowserActiveTabRead, "expire_tab", &result);
        result
    }

    // ---------------------------------------------------------------
    // Chat session ops
    // ---------------------------------------------------------------

    /// Create a new chat session.
    pub fn create_session(&self, origin: &Origin) -> HostResult<SessionId> {
        self.check(origin, Scope::ChatOpen, None)?;
        let session = ChatSession::new();
        let id = session.id;
        self.sessions.save(&session)?;
        self.live_sessions.write().unwrap_or_else(|e| e.into_inner()).insert(id, session);
        self.audit_session_op(id, origin, "create");
        Ok(id)
    }

    fn audit_session_op(&self, session_id: SessionId, origin: &Origin, op: &str) {
        let action = AuditAction::ChatSessionOp { session_id, op: op.to_string() };
        let proof = AuthorizationProof::Grant { origin: origin.as_str().to_string(), scope: Scope::ChatOpen };
        let _ = self.audit.append(session_id, action, proof, AuditOutcome::success());
    }

    /// Send a message, driving the Chat Orchestrator for one bounded
    /// turn, using the currently active LLM provider.
    pub async fn send_message(&self, origin: &Origin, session_id: SessionId, text: impl Into<String>) -> HostResult<RunOutcome> {
        self.check(origin, Scope::ModelPrompt, None)?;

        let mut session = self.load_live(session_id)?;
        let provider = self.providers.active_provider()?;
        let orchestrator = ChatOrchestrator::new(
            provider,
            self.mcp.clone(),
            self.grants.clone(),
            self.budgets.clone(),
            self.audit.clone(),
            self.events.clone(),
            self.base_system_prompt.clone(),
        );
        let cancellation = CancellationToken::new();
        let outcome = orchestrator.run_turn(&mut session, origin, text, &cancellation).await;

        self.sessions.save(&session)?;
        self.live_sessions.write().unwrap_or_else(|e| e.into_inner()).insert(session_id, session);
        self.audit_session_op(session_id, origin, "send");

        Ok(outcome?)
    }

    /// Fetch a session's current state.
    pub fn get_session(&self, origin: &Origin, session_id: SessionId) -> HostResult<ChatSession> {
        let session = self.load_live(session_id)?;
        self.audit_session_op(session_id, origin, "get");
        Ok(session)
    }

    /// List every persisted session summary.
    pub fn list_sessions(&self, origin: &Origin) -> HostResult<Vec<harbor_runtime::SessionSummary>> {
        let result = self.sessions.list().map_err(HostError::from);
        self.audit_session_op(SessionId::new(), origin, "list");
        result
    }

    /// Toggle a server's tools on/off for a session (the `update` op).
    pub fn update_session_servers(&self, origin: &Origin, session_id: SessionId, server_id: &str, enabled: bool) -> HostResult<()> {
        let mut session = self.load_live(session_id)?;
        if enabled {
            session.enable_server(server_id);
        } else {
            session.disable_server(server_id);
        }
        self.sessions.save(&session)?;
        self.live_sessions.write().unwrap_or_else(|e| e.into_inner()).insert(session_id, session);
        self.audit_session_op(session_id, origin, "update");
        Ok(())
    }

    /// Delete a session permanently.
    pub fn delete_session(&self, origin: &Origin, session_id: SessionId) -> HostResult<()> {
        self.sessions.delete(session_id)?;
        self.live_sessions.write().unwrap_or_else(|e| e.into_inner()).remove(&session_id);
        self.audit_session_op(session_id, origin, "delete");
        Ok(())
    }

    /// Clear a session's message log, keeping its identity and config.
    pub fn clear_session(&self, origin: &Origin, session_id: SessionId) -> HostResult<()> {
        let mut session = self.load_live(session_id)?;
        session.clear_messages();
        self.sessions.save(&session)?;
        self.live_sessions.write().unwrap_or_else(|e| e.into_inner()).insert(session_id, session);
        self.audit_session_op(session_id, origin, "clear");
        Ok(())
    }

    fn load_live(&self, session_id: SessionId) -> HostResult<ChatSession> {
        if let Some(session) = self.live_sessions.read().unwrap_or_else(|e| e.into_inner()).get(&session_id) {
            return Ok(session.clone());
        }
        let session = self.sessions.load(session_id)?;
        self.live_sessions.write().unwrap_or_else(|e| e.into_inner()).insert(session_id, session.clone());
        Ok(session)
    }

    // ---------------------------------------------------------------
    // LLM ops
    // ---------------------------------------------------------------

    /// Probe the environment for provider credentials.
    pub fn llm_detect(&self) -> Vec<String> {
        self.providers.detect()
    }

    /// List every registered provider.
    #[must_use]
    pub fn llm_list_providers(&self) -> Vec<crate::providers::ProviderDescriptor> {
        self.providers.list()
    }

    /// Set the active provider.
    pub fn llm_set_active(&self, id: &str) -> HostResult<()> {
        self.providers.set_active(id)
    }

    /// Configure a provider's API key.
    pub fn llm_set_api_key(&self, id: &str, api_key: &str) -> HostResult<()> {
        self.providers.set_api_key(id, api_key)
    }

    /// Drop a provider's API key.
    pub fn llm_remove_api_key(&self, id: &str) {
        self.providers.remove_api_key(id);
    }

    /// List the active provider's known models.
    pub fn llm_list_models(&self) -> HostResult<Vec<String>> {
        self.providers.list_models()
    }

    /// Direct chat completion, bypassing the Chat Orchestrator (no tool
    /// calls, no session persistence).
    pub async fn llm_chat(&self, origin: &Origin, messages: &[Message], tools: &[LlmToolDefinition], system: &str) -> HostResult<Message> {
        self.check(origin, Scope::ModelPrompt, None)?;
        let provider = self.providers.active_provider()?;
        let response = provider.complete(messages, tools, system).await.map_err(HostError::from)?;

        let action = AuditAction::LlmRequest {
            model: provider.model().to_string(),
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        };
        let proof = AuthorizationProof::Grant { origin: origin.as_str().to_string(), scope: Scope::ModelPrompt };
        let _ = self.audit.append(SessionId::new(), action, proof, AuditOutcome::success());

        Ok(response.message)
    }
}

fn to_outcome<T>(result: &Result<T, harbor_policy::PolicyError>) -> PolicyOutcome {
    if result.is_ok() { PolicyOutcome::Allowed } else { PolicyOutcome::Denied }
}
