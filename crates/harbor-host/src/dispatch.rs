//! Routes Transport frames to [`HostFacade`] operations and serializes
//! their results back onto the wire (§4.1, §4.6).
//!
//! Every inbound [`InboundFrame::Rpc`] carries an `origin` field in its
//! params, resolved first and checked against every gated operation by
//! the facade itself; a frame with no resolvable origin is a fail-secure
//! `invalid_request` error, never a dropped/ignored message (§7: "No
//! exception is ever silently swallowed").

use harbor_core::{Origin, Scope, SessionId};
use harbor_transport::{InboundFrame, OutboundFrame};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::HostError;
use crate::facade::HostFacade;

/// Dispatch one inbound frame against `facade`, producing the reply
/// frame to send back (or `None` for `Ping`/push-only cases the caller
/// already handles inline).
pub async fn dispatch(facade: &HostFacade, frame: InboundFrame) -> OutboundFrame {
    match frame {
        InboundFrame::Ping => OutboundFrame::pong(),
        InboundFrame::Rpc { id, method, params } => {
            match handle_rpc(facade, &method, params).await {
                Ok(value) => OutboundFrame::rpc_ok(id, value),
                Err(e) => OutboundFrame::rpc_err(id, e.code(), e.to_string()),
            }
        },
        InboundFrame::Legacy { payload } => {
            warn!(?payload, "legacy frame received; legacy protocol is not implemented");
            OutboundFrame::Legacy {
                payload: serde_json::json!({ "error": "legacy protocol not supported" }),
            }
        },
    }
}

#[derive(Deserialize)]
struct OriginParam {
    origin: String,
}

fn parse_origin(params: &Value) -> Result<Origin, HostError> {
    let parsed: OriginParam = serde_json::from_value(params.clone())
        .map_err(|e| HostError::InvalidRequest(format!("missing/invalid origin: {e}")))?;
    Origin::new(parsed.origin).map_err(|e| HostError::InvalidRequest(e.to_string()))
}

fn field<T: serde::de::DeserializeOwned>(params: &Value, name: &str) -> Result<T, HostError> {
    params
        .get(name)
        .cloned()
        .ok_or_else(|| HostError::InvalidRequest(format!("missing field: {name}")))
        .and_then(|v| serde_json::from_value(v).map_err(|e| HostError::InvalidRequest(e.to_string())))
}

fn optional_field<T: serde::de::DeserializeOwned>(params: &Value, name: &str) -> Result<Option<T>, HostError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| HostError::InvalidRequest(e.to_string())),
    }
}

async fn handle_rpc(facade: &HostFacade, method: &str, params: Value) -> Result<Value, HostError> {
    let origin = parse_origin(&params);

    match method {
        "listTools" => {
            let origin = origin?;
            let server_ids: Option<Vec<String>> = optional_field(&params, "serverIds")?;
            let tools = facade.list_tools(&origin, server_ids.as_deref()).await?;
            Ok(serde_json::to_value(tools).map_err(|e| HostError::Internal(e.to_string()))?)
        },
        "callTool" => {
            let origin = origin?;
            let server: String = field(&params, "serverId")?;
            let tool: String = field(&params, "toolName")?;
            let args: Value = field(&params, "args")?;
            let run_id: Option<String> = optional_field(&params, "runId")?;
            facade.call_tool(&origin, &server, &tool, args, run_id).await
        },
        "grant" => {
            let origin = origin?;
            let scope: Scope = field(&params, "scope")?;
            let tab_id: Option<String> = optional_field(&params, "tabId")?;
            let mut grant = harbor_policy::Grant::always(origin.clone(), scope);
            if let Some(tab) = tab_id {
                grant = grant.with_tab(tab);
            }
            facade.grant(&origin, grant)?;
            Ok(Value::Null)
        },
        "revoke" => {
            let origin = origin?;
            let scope: Scope = field(&params, "scope")?;
            facade.revoke(&origin, scope)?;
            Ok(Value::Null)
        },
        "checkPermission" => {
            let origin = origin?;
            let scope: Scope = field(&params, "scope")?;
            let tab_id: Option<String> = optional_field(&params, "tabId")?;
            let granted = facade.check(&origin, scope, tab_id.as_deref()).is_ok();
            Ok(serde_json::json!({ "granted": granted }))
        },
        "listGrants" => {
            let origin = origin?;
            let grants = facade.list_grants(&origin)?;
            Ok(serde_json::to_value(grants).map_err(|e| HostError::Internal(e.to_string()))?)
        },
        "expireTabGrants" => {
            let origin = origin?;
            let tab_id: String = field(&params, "tabId")?;
            facade.expire_tab_grants(&origin, &tab_id)?;
            Ok(Value::Null)
        },
        "createSession" => {
            let origin = origin?;
            let id = facade.create_session(&origin)?;
            Ok(serde_json::json!({ "sessionId": id.as_uuid() }))
        },
        "sendMessage" => {
            let origin = origin?;
            let session_id = session_id_field(&params)?;
            let text: String = field(&params, "text")?;
            let outcome = facade.send_message(&origin, session_id, text).await?;
            Ok(run_outcome_to_json(&outcome))
        },
        "getSession" => {
            let origin = origin?;
            let session_id = session_id_field(&params)?;
            let session = facade.get_session(&origin, session_id)?;
            Ok(serde_json::to_value(session).map_err(|e| HostError::Internal(e.to_string()))?)
        },
        "listSessions" => {
            let origin = origin?;
            let summaries = facade.list_sessions(&origin)?;
            Ok(serde_json::to_value(summaries).map_err(|e| HostError::Internal(e.to_string()))?)
        },
        "updateSession" => {
            let origin = origin?;
            let session_id = session_id_field(&params)?;
            let server_id: String = field(&params, "serverId")?;
            let enabled: bool = field(&params, "enabled")?;
            facade.update_session_servers(&origin, session_id, &server_id, enabled)?;
            Ok(Value::Null)
        },
        "deleteSession" => {
            let origin = origin?;
            let session_id = session_id_field(&params)?;
            facade.delete_session(&origin, session_id)?;
            Ok(Value::Null)
        },
        "clearSession" => {
            let origin = origin?;
            let session_id = session_id_field(&params)?;
            facade.clear_session(&origin, session_id)?;
            Ok(Value::Null)
        },
        "llmDetect" => Ok(serde_json::json!(facade.llm_detect())),
        "llmListProviders" => Ok(serde_json::to_value(facade.llm_list_providers()).map_err(|e| HostError::Internal(e.to_string()))?),
        "llmSetActive" => {
            let id: String = field(&params, "providerId")?;
            facade.llm_set_active(&id)?;
            Ok(Value::Null)
        },
        "llmSetApiKey" => {
            let id: String = field(&params, "providerId")?;
            let api_key: String = field(&params, "apiKey")?;
            facade.llm_set_api_key(&id, &api_key)?;
            Ok(Value::Null)
        },
        "llmRemoveApiKey" => {
            let id: String = field(&params, "providerId")?;
            facade.llm_remove_api_key(&id);
            Ok(Value::Null)
        },
        "llmListModels" => Ok(serde_json::json!(facade.llm_list_models()?)),
        "llmChat" => {
            let origin = origin?;
            let messages: Vec<harbor_llm::Message> = field(&params, "messages")?;
            let system: String = optional_field(&params, "system")?.unwrap_or_default();
            let message = facade.llm_chat(&origin, &messages, &[], &system).await?;
            Ok(serde_json::to_value(message).map_err(|e| HostError::Internal(e.to_string()))?)
        },
        other => Err(HostError::UnknownMethod(other.to_string())),
    }
}

fn session_id_field(params: &Value) -> Result<SessionId, HostError> {
    let raw: uuid::Uuid = field(params, "sessionId")?;
    Ok(SessionId::from_uuid(raw))
}

fn run_outcome_to_json(outcome: &harbor_runtime::RunOutcome) -> Value {
    match outcome {
        harbor_runtime::RunOutcome::Final { text } => serde_json::json!({ "kind": "final", "text": text }),
        harbor_runtime::RunOutcome::IterationBoundReached { max_iterations } => {
            serde_json::json!({ "kind": "iteration_bound_reached", "maxIterations": max_iterations })
        },
        harbor_runtime::RunOutcome::Cancelled => serde_json::json!({ "kind": "cancelled" }),
    }
}
