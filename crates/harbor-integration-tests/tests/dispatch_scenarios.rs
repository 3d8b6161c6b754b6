//! §8 end-to-end scenarios 1 and 4: the Transport/Host Facade dispatch
//! layer, driven exactly as the native-messaging host loop drives it —
//! an [`InboundFrame`] in, an [`OutboundFrame`] out — with no real LLM
//! provider or MCP server involved.

mod common;

use std::sync::Arc;

use harbor_core::Origin;
use harbor_events::EventBus;
use harbor_host::dispatch;
use harbor_mcp::{Connection, ConnectionKind, McpSupervisor, ServerConfig, ToolDefinition};
use harbor_policy::Grant;
use harbor_transport::{InboundFrame, OutboundFrame};

/// Scenario 1: inbound `{type:"ping"}` is answered with
/// `{type:"status", status:"pong"}`.
#[tokio::test]
async fn ping_is_answered_with_pong() {
    let (facade, _sessions) = common::bare_facade();

    let reply = dispatch(&facade, InboundFrame::Ping).await;

    match reply {
        OutboundFrame::Status { payload } => assert_eq!(payload, serde_json::json!("pong")),
        other => panic!("expected a Status(pong) frame, got {other:?}"),
    }
}

/// Scenario 4: an origin with no grants is denied `listTools` with
/// `scope_required`; after a once-grant, the next call succeeds and the
/// grant is consumed, so a third call is denied again.
#[tokio::test]
async fn permission_gate_consumes_the_once_grant() {
    let origin = Origin::new("https://x.test").expect("well-formed test origin");

    let mcp = Arc::new(McpSupervisor::new(EventBus::new()));
    mcp.add_server(ServerConfig::npm("gmail", "node")).await;
    let mut seeded = Connection::new("gmail", ConnectionKind::StdioDirect, None);
    seeded.catalog.tools = vec![ToolDefinition::new("search_emails", "gmail")];
    mcp.seed_connection("gmail", seeded).await;

    let (facade, _sessions) = common::facade_over(mcp);

    let denied = list_tools_frame(&facade, &origin).await;
    assert_eq!(denied["error"]["code"], "scope_required");

    facade
        .grant(&origin, Grant::once(origin.clone(), harbor_core::Scope::McpToolsList))
        .expect("grant succeeds");

    let allowed = list_tools_frame(&facade, &origin).await;
    assert!(allowed.get("error").is_none(), "expected success, got {allowed:?}");
    let tools = allowed["result"].as_array().expect("result is a tool array");
    assert_eq!(tools.len(), 1);

    let denied_again = list_tools_frame(&facade, &origin).await;
    assert_eq!(
        denied_again["error"]["code"], "scope_required",
        "the once-grant must be consumed after its first successful use"
    );
}

async fn list_tools_frame(facade: &harbor_host::HostFacade, origin: &Origin) -> serde_json::Value {
    let frame = InboundFrame::Rpc {
        id: "1".to_string(),
        method: "listTools".to_string(),
        params: serde_json::json!({ "origin": origin.as_str() }),
    };
    let reply = dispatch(facade, frame).await;
    match reply {
        OutboundFrame::RpcResponse { result: Ok(value), .. } => serde_json::json!({ "result": value }),
        OutboundFrame::RpcResponse { result: Err(e), .. } => {
            serde_json::json!({ "error": { "code": e.code.as_str(), "message": e.message } })
        },
        other => panic!("expected an RpcResponse frame, got {other:?}"),
    }
}
