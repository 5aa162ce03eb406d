//! Telemetry configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Default log file, created in the working directory.
pub const DEFAULT_LOG_FILE: &str = "anvil_chain.log";

/// Configuration for console and file logging.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,

    /// Log level filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` directive)
    pub log_level: String,

    /// Whether to log to stdout
    pub console_output: bool,

    /// Whether console output is JSON formatted
    pub json_logs: bool,

    /// Append-mode log file; `None` disables file logging
    pub log_file: Option<PathBuf>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "anvil-chain".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AC_SERVICE_NAME`: Service name (default: anvil-chain)
    /// - `AC_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `AC_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `AC_JSON_LOGS`: JSON console output (default: false)
    /// - `AC_LOG_FILE`: Log file path (default: anvil_chain.log, empty disables)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("AC_SERVICE_NAME")
                .unwrap_or_else(|_| "anvil-chain".to_string()),

            log_level: env::var("AC_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("AC_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("AC_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            log_file: match env::var("AC_LOG_FILE") {
                Ok(path) if path.trim().is_empty() => None,
                Ok(path) => Some(PathBuf::from(path)),
                Err(_) => Some(PathBuf::from(DEFAULT_LOG_FILE)),
            },
        }
    }

    /// Configuration without a log file, for tests and tooling.
    pub fn console_only() -> Self {
        Self {
            log_file: None,
            ..Self::default()
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
