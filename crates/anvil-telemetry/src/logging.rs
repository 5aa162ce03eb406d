//! Subscriber assembly: an `EnvFilter` over a console layer and an optional
//! plain-text file layer.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

use crate::{TelemetryConfig, TelemetryError};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Open `path` for appending, creating it if needed.
pub fn open_log_file(path: &Path) -> Result<File, TelemetryError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| TelemetryError::LogFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

pub(crate) fn build_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(level).map_err(|e| TelemetryError::Filter(e.to_string()))
}

/// Build the subscriber described by `config` without installing it.
pub fn build_subscriber(
    config: &TelemetryConfig,
) -> Result<impl Subscriber + Send + Sync + 'static, TelemetryError> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        if config.json_logs {
            layers.push(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .boxed(),
            );
        } else {
            layers.push(fmt::layer().with_target(false).boxed());
        }
    }

    if let Some(path) = &config.log_file {
        let file = open_log_file(path)?;
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .boxed(),
        );
    }

    let filter = build_filter(&config.log_level)?;
    Ok(tracing_subscriber::registry().with(layers).with(filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_is_rejected() {
        assert!(matches!(
            build_filter("info,anvil=notalevel"),
            Err(TelemetryError::Filter(_))
        ));
    }

    #[test]
    fn test_missing_directory_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("node.log");
        assert!(matches!(
            open_log_file(&path),
            Err(TelemetryError::LogFile { .. })
        ));
    }

    #[test]
    fn test_file_layer_writes_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.log");
        let config = TelemetryConfig {
            console_output: false,
            log_file: Some(path.clone()),
            ..TelemetryConfig::default()
        };

        let subscriber = build_subscriber(&config).unwrap();
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(miner = 3, "[ac-05] block published");
            tracing::debug!("filtered out at info level");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[ac-05] block published"));
        assert!(contents.contains("miner=3"));
        assert!(!contents.contains("filtered out"));
        assert!(!contents.contains('\u{1b}'), "no ANSI escapes in the file");
    }
}
