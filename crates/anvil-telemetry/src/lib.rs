//! # Anvil Telemetry
//!
//! Logging setup shared by the node binary and test harnesses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use anvil_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! tracing::info!("[node] started");
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AC_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `AC_JSON_LOGS` | `false` | JSON console output |
//! | `AC_CONSOLE_OUTPUT` | `true` | Log to stdout |
//! | `AC_LOG_FILE` | `anvil_chain.log` | Log file (empty disables) |

mod config;
mod logging;

pub use config::{TelemetryConfig, DEFAULT_LOG_FILE};
pub use logging::{build_subscriber, open_log_file};

use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::util::SubscriberInitExt;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to open log file {path}: {reason}")]
    LogFile { path: String, reason: String },

    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("Global subscriber already installed: {0}")]
    AlreadyInstalled(String),
}

/// Install the global subscriber.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::build_subscriber(&config)?
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInstalled(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        log_file = ?config.log_file,
        "📡 Telemetry initialized"
    );

    Ok(TelemetryGuard {
        log_file: config.log_file,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    log_file: Option<PathBuf>,
}

impl TelemetryGuard {
    /// Path of the log file, if file logging is enabled.
    pub fn log_file(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}
