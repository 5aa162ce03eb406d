//! # Anvil-Chain Node
//!
//! ```text
//! anvil-node [CONFIG_FILE]
//! ```
//!
//! `CONFIG_FILE` (or `AC_CONFIG`) is either the line format or a
//! `.json` file; see [`node_runtime::config`]. Logging is configured with
//! the `AC_LOG_*` variables.
//!
//! ## Signals
//!
//! | Signal | Effect |
//! |--------|--------|
//! | Ctrl-C / SIGTERM | ordered shutdown, final statistics, ledger dump |
//! | SIGUSR1 | statistics report, node keeps running |
//!
//! The node also shuts down on its own once the ledger is full.

use std::path::PathBuf;

use anvil_telemetry::{init_telemetry, TelemetryConfig};
use anyhow::{Context, Result};
use node_runtime::{Node, NodeConfig};
use tracing::info;

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("AC_CONFIG").map(PathBuf::from))
}

#[cfg(unix)]
async fn wait_for_stop(node: &Node) -> Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1()).context("Failed to install SIGUSR1 handler")?;
    let mut term = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok("interrupt"),
            _ = term.recv() => return Ok("terminate"),
            _ = node.stopped() => return Ok("ledger full"),
            _ = usr1.recv() => {
                info!("[node] SIGUSR1 received, requesting statistics");
                node.request_report();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_stop(node: &Node) -> Result<&'static str> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            Ok("interrupt")
        }
        _ = node.stopped() => Ok("ledger full"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize logging")?;

    let path = config_path();
    let config = NodeConfig::load(path.as_deref()).context("Failed to load configuration")?;
    info!(config = ?path, "[node] Configuration loaded");

    let node = Node::start(config).context("Failed to start node")?;
    info!("[node] Node is running. Press Ctrl+C to stop.");

    let reason = wait_for_stop(&node).await?;
    info!(reason, "[node] Stopping");

    let summary = node.shutdown().await;
    info!(
        committed = summary.ledger.blocks.len(),
        valid = summary.statistics.total_valid,
        invalid = summary.statistics.total_invalid,
        "[node] Goodbye"
    );
    Ok(())
}
