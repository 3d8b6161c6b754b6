//! The isolated runner-child mode (`--mcp-runner <serverId>`, §6).
//!
//! Looks up the named Installed Server in the persisted server catalog
//! and execs its configured command in place, inheriting stdio so the
//! parent supervisor's stdio transport connects straight through to the
//! real server process. The exec, not a spawn-and-wait, is deliberate:
//! this process contributes nothing once the real server is running, so
//! there is no reason to keep it around as a pass-through layer.

use std::os::unix::process::CommandExt;
use std::process::Command;

use harbor_core::HarborHome;
use harbor_mcp::ServersConfig;

/// Exec the named server's process in place of this one.
///
/// # Errors
///
/// Returns an error if the home directory cannot be resolved, the
/// server id is unknown, the server has no command (it isn't a
/// process-based server), or the exec itself fails.
pub fn run(server_id: &str) -> anyhow::Result<()> {
    let home = HarborHome::resolve()?;
    let servers = ServersConfig::load_or_default(home.servers_config_path())?;

    let server = servers
        .get(server_id)
        .ok_or_else(|| anyhow::anyhow!("unknown server id '{server_id}'"))?;

    let command = server
        .command
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("server '{server_id}' has no command (not process-based)"))?;

    let mut cmd = Command::new(command);
    cmd.args(&server.args);
    for (key, value) in &server.env {
        cmd.env(key, value);
    }
    if let Some(cwd) = &server.cwd {
        cmd.current_dir(cwd);
    }

    // Replaces this process; only returns on failure to exec.
    Err(cmd.exec().into())
}
