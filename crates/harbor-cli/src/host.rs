//! The resident native-messaging host (§4.1, §6): owns the Host Facade
//! and drives its framed RPC loop over stdin/stdout, forwarding
//! `harbor-events` pushes to the extension as `status` frames.

use std::sync::Arc;

use harbor_audit::{AuditLog, FileAuditStorage};
use harbor_config::HarborConfig;
use harbor_core::HarborHome;
use harbor_events::EventBus;
use harbor_host::{dispatch, HostFacade, ProviderRegistry};
use harbor_mcp::{McpSupervisor, ServersConfig};
use harbor_policy::{GrantStore, RateBudgets};
use harbor_runtime::SessionStore;
use harbor_transport::{InboundFrame, InboundReader, OutboundWriter};
use tracing::{info, warn};

const BASE_SYSTEM_PROMPT: &str = "You are Harbor, a tool-augmented assistant running inside the user's browser.";

/// Run the resident host: load config, wire every subsystem, and serve
/// frames on stdin/stdout until the stream closes.
///
/// # Errors
///
/// Returns an error only on unrecoverable startup failures (home
/// directory resolution, audit log open). Per-frame failures never
/// propagate here — they become `rpc_response` error frames.
pub async fn run() -> anyhow::Result<()> {
    harbor_telemetry::setup_default_logging()?;

    let home = HarborHome::resolve()?;
    home.ensure()?;

    let config = HarborConfig::load_with_home(home.root()).unwrap_or_else(|e| {
        warn!(error = %e, "harbor.toml invalid or unreadable, using defaults");
        HarborConfig::default()
    });

    let events = EventBus::new();
    let grants = Arc::new(GrantStore::in_memory());
    let budgets = Arc::new(RateBudgets::new(
        config.rate_budget.limit,
        config.rate_budget.window(),
    ));
    let mcp = Arc::new(McpSupervisor::new(events.clone()));

    let servers = ServersConfig::load_or_default(home.servers_config_path())?;
    for server in servers.auto_start_servers() {
        mcp.add_server(server.clone()).await;
    }

    let audit_storage = FileAuditStorage::open(home.root().join("audit.jsonl"))?;
    let audit = Arc::new(AuditLog::new(Arc::new(audit_storage)));

    let providers = Arc::new(ProviderRegistry::new());
    providers.detect();

    let sessions = SessionStore::new(home.sessions_dir());

    let facade = Arc::new(HostFacade::new(
        grants,
        budgets,
        mcp,
        audit,
        events.clone(),
        providers,
        sessions,
        BASE_SYSTEM_PROMPT,
    ));

    let mut inbound = InboundReader::new(tokio::io::stdin());
    let mut outbound = OutboundWriter::new(tokio::io::stdout());
    let mut push_events = events.subscribe();

    info!("harbor native-messaging host ready");

    loop {
        tokio::select! {
            frame = inbound.next_frame() => {
                let Some(frame) = frame? else {
                    info!("stdin closed, shutting down");
                    break;
                };
                let reply = match frame {
                    InboundFrame::Legacy { .. } => {
                        warn!("legacy frame received; legacy bridging is not implemented");
                        continue;
                    },
                    frame => dispatch(&facade, frame).await,
                };
                outbound.send(&reply).await?;
            },
            event = push_events.recv() => {
                let Some(event) = event else { continue };
                let payload = serde_json::to_value(event.as_ref())?;
                outbound.send(&harbor_transport::OutboundFrame::Status { payload }).await?;
            },
        }
    }

    Ok(())
}
