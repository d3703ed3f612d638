//! Logging initialization for the client.
//!
//! Structured JSONL goes to `~/.feedline/logs/feedline.jsonl` so a session's
//! history can be inspected with `tail -f ... | jq`. A compact stderr layer is
//! available for foreground debugging.

use crate::{CoreError, CoreResult};
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Settings for the tracing subscriber.
#[derive(Debug, Clone)]
pub struct LogSettings {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub default_level: String,
    /// Append JSONL output to this file when set.
    pub log_path: Option<PathBuf>,
    /// Also emit compact human-readable lines on stderr.
    pub also_stderr: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            default_level: crate::DEFAULT_LOG_LEVEL.into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global tracing subscriber.
///
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init_logging(settings: &LogSettings) -> CoreResult<()> {
    let file_layer = match &settings.log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file))
                    .with_filter(env_filter(&settings.default_level)),
            )
        }
        None => None,
    };

    let stderr_layer = settings.also_stderr.then(|| {
        fmt::layer()
            .compact()
            .with_target(true)
            .with_writer(io::stderr)
            .with_filter(env_filter(&settings.default_level))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    if let Some(path) = &settings.log_path {
        tracing::debug!(log_path = %path.display(), "logging initialized");
    }

    Ok(())
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
