//! Harbor - the browser-resident Agent Runtime Bridge.
//!
//! One binary, two modes (§6): `--native-messaging` (the default) runs
//! the resident host process, framing RPC over stdin/stdout to a
//! browser extension; `--mcp-runner <serverId>` is the isolated-runner
//! child mode spawned by the MCP Supervisor to exec an installed
//! server's process.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod host;
mod runner;

use std::process::ExitCode;

use clap::Parser;

/// Harbor Agent Runtime Bridge.
#[derive(Parser)]
#[command(name = "harbor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run as the resident native-messaging host (default mode).
    #[arg(long)]
    native_messaging: bool,

    /// Run as an isolated runner child, exec'ing the named installed
    /// server's process.
    #[arg(long, value_name = "SERVER_ID")]
    mcp_runner: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(server_id) = cli.mcp_runner {
        return match runner::run(&server_id) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("harbor: mcp-runner failed: {e}");
                ExitCode::FAILURE
            },
        };
    }

    let _ = cli.native_messaging;
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("harbor: failed to start async runtime: {e}");
            return ExitCode::FAILURE;
        },
    };

    match runtime.block_on(host::run()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("harbor: fatal error: {e}");
            ExitCode::FAILURE
        },
    }
}
