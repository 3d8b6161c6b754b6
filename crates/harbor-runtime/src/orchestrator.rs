//! The Chat Orchestrator (§4.5): a bounded agent loop over a
//! [`ChatSession`], stripped to exactly what the loop itself requires —
//! no hooks, no sub-agents, no workspace boundary, no capability-token
//! approval flow (those belong to a richer coding-agent runtime this
//! facade doesn't expose).

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use harbor_audit::{AuditAction, AuditLog, AuditOutcome, AuthorizationProof};
use harbor_core::{Origin, Scope, SessionId};
use harbor_crypto::ContentHash;
use harbor_events::{EventBus, EventMetadata, HarborEvent, OrchestrationStep};
use harbor_llm::{LlmProvider, LlmToolDefinition, Message, MessageRole, ToolCall, ToolCallResult};
use harbor_mcp::McpSupervisor;
use harbor_policy::{GrantStore, PolicyOutcome, RateBudgets};
use tracing::{debug, warn};

use crate::context::ContextManager;
use crate::error::{RuntimeError, RuntimeResult};
use crate::parser;
use crate::session::ChatSession;

/// Resource name rate budgets are tracked under for tool calls.
const TOOL_CALL_BUDGET_RESOURCE: &str = "mcp:tools.call";

/// A single dispatched call's shape, resolved from the active tool
/// mapping built in step 2.
struct ResolvedCall {
    call: ToolCall,
    server_id: String,
    tool_name: String,
}

/// A handle a caller can flip to cancel an in-flight run (§5
/// Cancellation).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a fresh, unset token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the token cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The outcome of running one turn of the orchestrator loop.
#[derive(Clone)]
pub enum RunOutcome {
    /// The model produced a final answer with no further tool calls.
    Final {
        /// The final answer text.
        text: String,
    },
    /// The run ended because the iteration bound was reached without a
    /// final answer.
    IterationBoundReached {
        /// The configured bound that was hit.
        max_iterations: u32,
    },
    /// The run was cancelled mid-loop.
    Cancelled,
}

/// Drives the bounded agent loop described in §4.5.
pub struct ChatOrchestrator<P: LlmProvider> {
    llm: Arc<P>,
    mcp: Arc<McpSupervisor>,
    grants: Arc<GrantStore>,
    budgets: Arc<RateBudgets>,
    audit: Arc<AuditLog>,
    events: EventBus,
    context: ContextManager,
    base_system_prompt: String,
}

impl<P: LlmProvider> ChatOrchestrator<P> {
    /// Build an orchestrator over the given subsystems.
    #[must_use]
    pub fn new(
        llm: Arc<P>,
        mcp: Arc<McpSupervisor>,
        grants: Arc<GrantStore>,
        budgets: Arc<RateBudgets>,
        audit: Arc<AuditLog>,
        events: EventBus,
        base_system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            mcp,
            grants,
            budgets,
            audit,
            events,
            context: ContextManager::default(),
            base_system_prompt: base_system_prompt.into(),
        }
    }

    /// Run one bounded agent loop for `session` given a new user
    /// message, dispatching tool calls as `origin`'s authority (§4.5,
    /// §4.6).
    ///
    /// # Errors
    ///
    /// Returns an error for LLM failures not tolerated as a loop
    /// termination condition (malformed responses that aren't simply
    /// "no tool call" are treated as the final answer, per §4.5.1).
    pub async fn run_turn(
        &self,
        session: &mut ChatSession,
        origin: &Origin,
        user_message: impl Into<String>,
        cancellation: &CancellationToken,
    ) -> RuntimeResult<RunOutcome> {
        session.push_message(Message::user(user_message));

        if self.context.needs_summarization(&session.messages, self.llm.as_ref()) {
            self.summarize_session(session).await?;
        }

        let max_iterations = session.config.max_iterations;

        for iteration in 0..max_iterations {
            if cancellation.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }

            let tool_mapping = self.build_tool_mapping(session).await;
            let llm_tools = self.active_tool_set(session, &tool_mapping);

            let system_prompt = self.build_system_prompt(session, &llm_tools);

            let response = self
                .llm
                .complete(&session.messages, &llm_tools, &system_prompt)
                .await?;

            let response_text = response.message.text().unwrap_or_default().to_string();
            self.publish_step(session.id, OrchestrationStep::Thought { text: response_text.clone() });

            let calls = self.extract_tool_calls(&response_text, &response, &tool_mapping);

            if calls.is_empty() {
                session.push_message(Message::assistant(&response_text));
                self.publish_step(session.id, OrchestrationStep::Final { text: response_text.clone() });
                return Ok(RunOutcome::Final { text: response_text });
            }

            if cancellation.is_cancelled() {
                return Ok(RunOutcome::Cancelled);
            }

            self.publish_step(
                session.id,
                OrchestrationStep::ToolCalls {
                    calls: calls
                        .iter()
                        .map(|c| (c.server_id.clone(), c.tool_name.clone()))
                        .collect(),
                },
            );

            session.push_message(Message::assistant_with_tools(
                calls.iter().map(|c| c.call.clone()).collect(),
            ));

            let mut step_results = Vec::with_capacity(calls.len());
            for resolved in &calls {
                let outcome = self.dispatch_tool_call(session.id, origin, resolved).await;
                let wire_result = match &outcome {
                    Ok(result) => Ok(serde_json::json!({ "content": result.content })),
                    Err(e) => Err(e.code().as_str().to_string()),
                };
                step_results.push(wire_result);

                let message_result = match outcome {
                    Ok(result) => result,
                    Err(e) => ToolCallResult::error(resolved.call.id.clone(), e.to_string()),
                };
                session.push_message(Message::tool_result(message_result));
            }

            self.publish_step(session.id, OrchestrationStep::ToolResults { results: step_results });

            debug!(iteration, session = %session.id, "orchestrator iteration completed");
        }

        self.publish_step(
            session.id,
            OrchestrationStep::Error {
                code: "internal".to_string(),
                message: format!("iteration bound of {max_iterations} reached without a final answer"),
            },
        );

        Ok(RunOutcome::IterationBoundReached { max_iterations })
    }

    /// Build the `toolName -> (serverId, toolName)` mapping for step 2:
    /// the union of tools from connections whose server is enabled on
    /// this session, flat-named with a `__` separator for uniqueness.
    async fn build_tool_mapping(&self, session: &ChatSession) -> HashMap<String, (String, String)> {
        let mut mapping = HashMap::new();
        for tool in self.mcp.list_tools().await {
            if !session.enabled_servers.contains(&tool.server) {
                continue;
            }
            let qualified = format!("{}__{}", tool.server, tool.name);
            mapping.insert(qualified, (tool.server.clone(), tool.name.clone()));
        }
        mapping
    }

    /// Build the tool definitions offered to the LLM this iteration,
    /// optionally narrowed by the tool router (§4.5 step 3): a keyword
    /// filter over the most recent user message, opt-in per session.
    /// When the router is off, or would otherwise leave nothing for the
    /// model to call, the full set is offered unfiltered.
    fn active_tool_set(
        &self,
        session: &ChatSession,
        mapping: &HashMap<String, (String, String)>,
    ) -> Vec<LlmToolDefinition> {
        let full_set = || {
            mapping
                .keys()
                .map(|name| LlmToolDefinition::new(name.clone()))
                .collect::<Vec<_>>()
        };

        if !session.config.tool_router_enabled {
            return full_set();
        }

        let Some(keywords) = session
            .messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .and_then(Message::text)
            .map(router_keywords)
        else {
            return full_set();
        };

        if keywords.is_empty() {
            return full_set();
        }

        let narrowed: Vec<LlmToolDefinition> = mapping
            .keys()
            .filter(|name| {
                let lower = name.to_lowercase();
                keywords.iter().any(|kw| lower.contains(kw.as_str()))
            })
            .map(|name| LlmToolDefinition::new(name.clone()))
            .collect();

        if narrowed.is_empty() {
            full_set()
        } else {
            narrowed
        }
    }

    fn build_system_prompt(&self, session: &ChatSession, tools: &[LlmToolDefinition]) -> String {
        let mut prompt = self.base_system_prompt.clone();
        if let Some(ref override_prompt) = session.system_prompt_override {
            prompt.push_str("\n\n");
            prompt.push_str(override_prompt);
        }
        if !tools.is_empty() {
            prompt.push_str("\n\nAvailable tools:\n");
            for tool in tools {
                prompt.push_str(&format!("- {}\n", tool.name));
            }
        }
        prompt
    }

    /// Extract the tool calls for this iteration: prefer the provider's
    /// native tool calls; fall back to the text-based parser (§4.5.1).
    fn extract_tool_calls(
        &self,
        response_text: &str,
        response: &harbor_llm::LlmResponse,
        tool_mapping: &HashMap<String, (String, String)>,
    ) -> Vec<ResolvedCall> {
        if let Some(native_calls) = response.message.tool_calls() {
            return native_calls
                .iter()
                .filter_map(|call| {
                    tool_mapping.get(&call.name).map(|(server, tool)| ResolvedCall {
                        call: call.clone(),
                        server_id: server.clone(),
                        tool_name: tool.clone(),
                    })
                })
                .collect();
        }

        let names: HashSet<String> = tool_mapping.keys().cloned().collect();
        match parser::parse_tool_call(response_text, &names) {
            Some(parsed) => {
                let (server, tool) = tool_mapping
                    .get(&parsed.name)
                    .expect("parser only returns names present in the mapping");
                vec![ResolvedCall {
                    call: ToolCall::new(uuid::Uuid::new_v4().to_string(), parsed.name)
                        .with_arguments(parsed.arguments),
                    server_id: server.clone(),
                    tool_name: tool.clone(),
                }]
            }
            None => Vec::new(),
        }
    }

    /// Enforce policy, consume a budget unit, dispatch via the MCP
    /// Supervisor, and record an audit entry — step 6.
    async fn dispatch_tool_call(
        &self,
        session_id: SessionId,
        origin: &Origin,
        resolved: &ResolvedCall,
    ) -> RuntimeResult<ToolCallResult> {
        let args_hash = ContentHash::hash(resolved.call.arguments.to_string().as_bytes());

        if let Err(e) = self.grants.check_tool(origin, None, &resolved.tool_name, None) {
            self.grants.record(origin, Scope::McpToolsCall, PolicyOutcome::Denied);
            self.record_tool_audit(session_id, resolved, args_hash, AuthorizationProof::Denied {
                reason: e.to_string(),
            }, AuditOutcome::failure(e.to_string()));
            return Err(RuntimeError::PolicyError(e));
        }

        if !self.budgets.acquire(origin, TOOL_CALL_BUDGET_RESOURCE) {
            let e = harbor_policy::PolicyError::RateLimited {
                origin: origin.as_str().to_string(),
                resource: TOOL_CALL_BUDGET_RESOURCE.to_string(),
            };
            self.record_tool_audit(session_id, resolved, args_hash, AuthorizationProof::Denied {
                reason: e.to_string(),
            }, AuditOutcome::failure(e.to_string()));
            return Err(RuntimeError::PolicyError(e));
        }

        self.grants.record(origin, Scope::McpToolsCall, PolicyOutcome::Allowed);

        let dispatch = self
            .mcp
            .call_tool(&resolved.server_id, &resolved.tool_name, resolved.call.arguments.clone())
            .await;

        let authorization = AuthorizationProof::Grant {
            origin: origin.as_str().to_string(),
            scope: Scope::McpToolsCall,
        };

        match dispatch {
            Ok(result) => {
                self.record_tool_audit(
                    session_id,
                    resolved,
                    args_hash,
                    authorization,
                    AuditOutcome::success(),
                );
                Ok(ToolCallResult::success(resolved.call.id.clone(), result.text_content()))
            }
            Err(e) => {
                self.record_tool_audit(
                    session_id,
                    resolved,
                    args_hash,
                    authorization,
                    AuditOutcome::failure(e.to_string()),
                );
                Err(RuntimeError::McpError(e))
            }
        }
    }

    fn record_tool_audit(
        &self,
        session_id: SessionId,
        resolved: &ResolvedCall,
        args_hash: ContentHash,
        authorization: AuthorizationProof,
        outcome: AuditOutcome,
    ) {
        if let Err(e) = self.audit.append(
            session_id,
            AuditAction::McpToolCall {
                server: resolved.server_id.clone(),
                tool: resolved.tool_name.clone(),
                args_hash,
                run_id: None,
            },
            authorization,
            outcome,
        ) {
            warn!(error = %e, "failed to append audit entry for tool call");
        }
    }

    async fn summarize_session(&self, session: &mut ChatSession) -> RuntimeResult<()> {
        let result = self.context.summarize(&session.messages, self.llm.as_ref()).await?;

        let keep_from = result.evicted_count;
        let mut new_messages = vec![Message::system(format!(
            "Earlier conversation summary: {}",
            result.summary_text
        ))];
        new_messages.extend(session.messages.split_off(keep_from));
        session.messages = new_messages;

        if let Err(e) = self.audit.append(
            session.id,
            AuditAction::ContextSummarized {
                evicted_count: result.evicted_count,
                tokens_freed: result.tokens_freed,
            },
            AuthorizationProof::System {
                reason: "context window approaching limit".to_string(),
            },
            AuditOutcome::success(),
        ) {
            warn!(error = %e, "failed to append audit entry for context summarization");
        }

        Ok(())
    }

    fn publish_step(&self, session_id: SessionId, step: OrchestrationStep) {
        self.events.publish(HarborEvent::OrchestrationStep {
            metadata: EventMetadata::new("runtime"),
            session_id,
            step,
        });
    }
}

/// Tokenize `text` into lowercase alphanumeric words of length >= 3, for
/// the tool router's keyword filter (§4.5 step 3).
fn router_keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() >= 3)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use harbor_llm::{LlmResponse, LlmResult, StopReason, StreamBox, Usage};
    use std::sync::Mutex;

    struct ScriptedProvider {
        responses: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(str::to_string).collect()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-model"
        }

        async fn stream(
            &self,
            _messages: &[Message],
            _tools: &[LlmToolDefinition],
            _system: &str,
        ) -> LlmResult<StreamBox> {
            unimplemented!("orchestrator uses complete(), not stream()")
        }

        async fn complete(
            &self,
            _messages: &[Message],
            _tools: &[LlmToolDefinition],
            _system: &str,
        ) -> LlmResult<LlmResponse> {
            let mut responses = self.responses.lock().unwrap();
            let text = if responses.is_empty() {
                String::new()
            } else {
                responses.remove(0)
            };
            Ok(LlmResponse {
                message: Message::assistant(text),
                has_tool_calls: false,
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }

        fn max_context_length(&self) -> usize {
            100_000
        }
    }

    fn test_harness(
        responses: Vec<&str>,
    ) -> (ChatOrchestrator<ScriptedProvider>, Arc<GrantStore>, Origin) {
        let llm = Arc::new(ScriptedProvider::new(responses));
        let mcp = Arc::new(McpSupervisor::new(EventBus::new()));
        let grants = Arc::new(GrantStore::in_memory());
        let budgets = Arc::new(RateBudgets::new(100, std::time::Duration::from_secs(60)));
        let audit = Arc::new(AuditLog::in_memory());
        let events = EventBus::new();

        let orchestrator = ChatOrchestrator::new(llm, mcp, grants.clone(), budgets, audit, events, "You are Harbor.");
        let origin = Origin::new("https://x.test").unwrap();
        (orchestrator, grants, origin)
    }

    #[tokio::test]
    async fn final_answer_with_no_tool_calls_ends_the_run() {
        let (orchestrator, _grants, origin) = test_harness(vec!["The answer is 42."]);
        let mut session = ChatSession::new();
        let cancellation = CancellationToken::new();

        let outcome = orchestrator
            .run_turn(&mut session, &origin, "what is the answer?", &cancellation)
            .await
            .unwrap();

        match outcome {
            RunOutcome::Final { text } => assert_eq!(text, "The answer is 42."),
            other => panic!("expected Final, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_before_the_first_iteration_stops_the_run() {
        let (orchestrator, _grants, origin) = test_harness(vec!["unused"]);
        let mut session = ChatSession::new();
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let outcome = orchestrator
            .run_turn(&mut session, &origin, "hello", &cancellation)
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Cancelled));
    }

    fn tool_mapping_fixture() -> HashMap<String, (String, String)> {
        [
            ("weather__forecast".to_string(), ("weather".to_string(), "forecast".to_string())),
            ("weather__alerts".to_string(), ("weather".to_string(), "alerts".to_string())),
            ("calendar__create_event".to_string(), ("calendar".to_string(), "create_event".to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn tool_router_disabled_returns_every_tool() {
        let (orchestrator, _grants, _origin) = test_harness(vec!["unused"]);
        let mut session = ChatSession::new();
        session.push_message(Message::user("what's the weather tomorrow?"));
        let mapping = tool_mapping_fixture();

        let tools = orchestrator.active_tool_set(&session, &mapping);

        assert_eq!(tools.len(), mapping.len());
    }

    #[tokio::test]
    async fn tool_router_enabled_narrows_to_keyword_matches() {
        let (orchestrator, _grants, _origin) = test_harness(vec!["unused"]);
        let mut session = ChatSession::new();
        session.config.tool_router_enabled = true;
        session.push_message(Message::user("what's the weather forecast tomorrow?"));
        let mapping = tool_mapping_fixture();

        let tools = orchestrator.active_tool_set(&session, &mapping);

        let names: HashSet<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains("weather__forecast"));
        assert!(names.contains("weather__alerts"));
        assert!(!names.contains("calendar__create_event"));
    }

    #[tokio::test]
    async fn tool_router_enabled_falls_back_to_full_set_when_nothing_matches() {
        let (orchestrator, _grants, _origin) = test_harness(vec!["unused"]);
        let mut session = ChatSession::new();
        session.config.tool_router_enabled = true;
        session.push_message(Message::user("xyzxyzxyz unrelated gibberish"));
        let mapping = tool_mapping_fixture();

        let tools = orchestrator.active_tool_set(&session, &mapping);

        assert_eq!(tools.len(), mapping.len());
    }
}

impl std::fmt::Debug for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Final { text } => write!(f, "Final({text:?})"),
            Self::IterationBoundReached { max_iterations } => {
                write!(f, "IterationBoundReached({max_iterations})")
            }
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}
