//! Tracing setup: stderr always, plus an optional log file.
//!
//! The file lives at `~/.config/summon/logs/summon.log`. `RUST_LOG`
//! overrides the configured level when set.

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_NAME: &str = "summon.log";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Whether file logging is enabled. Defaults to `false`.
    pub enabled: bool,
    /// Minimum log level: "trace", "debug", "info", "warn", or "error".
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".into(),
        }
    }
}

impl LogConfig {
    /// Normalised level directive. Unknown values fall back to `info`.
    fn directive(&self) -> &'static str {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" => "warn",
            "error" => "error",
            _ => "info",
        }
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// Keep the returned guard alive for the whole process; dropping it
/// flushes and closes the log file. Returns `None` when file logging
/// is off or the log directory cannot be created.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directive()));

    let (file_layer, guard) = match file_writer(config) {
        Some((writer, guard)) => (
            Some(fmt::layer().with_ansi(false).with_writer(writer)),
            Some(guard),
        ),
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();

    if result.is_err() {
        // Already installed (tests, or a host application).
        return None;
    }
    guard
}

fn file_writer(
    config: &LogConfig,
) -> Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    if !config.enabled {
        return None;
    }
    let dir = crate::config::log_dir()?;
    std::fs::create_dir_all(&dir).ok()?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    Some(tracing_appender::non_blocking(appender))
}
