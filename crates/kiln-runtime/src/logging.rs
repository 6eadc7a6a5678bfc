//! Logging setup for the kiln runtime.
//!
//! A thin, configuration-driven wrapper over `tracing-subscriber`. The
//! `RUST_LOG` environment variable, when set, overrides the configured
//! level.
//!
//! ```rust,ignore
//! use kiln_runtime::logging::{self, LoggingConfig};
//!
//! let _guard = logging::init_from_config(&LoggingConfig::default());
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Default single-line format.
    #[default]
    Full,
    /// Abbreviated single-line format.
    Compact,
    /// Multi-line human-oriented format.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (e.g. `info`, `kiln=debug`).
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Log file path; stdout when unset.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            file: None,
        }
    }
}

/// Keeps the file writer's background worker alive.
///
/// Hold this for the lifetime of the application; dropping it flushes and
/// stops file logging.
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Initializes the global subscriber from `config`.
///
/// Tolerant of repeated calls: if a subscriber is already installed the call
/// is a no-op apart from a note on stderr.
pub fn init_from_config(config: &LoggingConfig) -> LoggingGuard {
    let filter = env_filter(&config.level);

    let (guard, result) = match &config.file {
        Some(path) => {
            let (writer, guard) = file_writer(path);
            (Some(guard), init_with_writer(config.format, filter, writer))
        }
        None => (None, init_stdout(config.format, filter)),
    };

    if let Err(err) = result {
        eprintln!("Warning: logging already initialized ({err})");
    }

    LoggingGuard { _file: guard }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn file_writer(path: &Path) -> (NonBlocking, WorkerGuard) {
    let directory = path.parent().filter(|p| !p.as_os_str().is_empty());
    let file_name = path.file_name().unwrap_or_else(|| "kiln.log".as_ref());
    let appender =
        tracing_appender::rolling::never(directory.unwrap_or_else(|| ".".as_ref()), file_name);
    tracing_appender::non_blocking(appender)
}

fn init_stdout(format: LogFormat, filter: EnvFilter) -> Result<(), TryInitError> {
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Full => builder.finish().try_init(),
        LogFormat::Compact => builder.compact().finish().try_init(),
        LogFormat::Pretty => builder.pretty().finish().try_init(),
    }
}

fn init_with_writer(
    format: LogFormat,
    filter: EnvFilter,
    writer: NonBlocking,
) -> Result<(), TryInitError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false);
    match format {
        LogFormat::Full => builder.finish().try_init(),
        LogFormat::Compact => builder.compact().finish().try_init(),
        LogFormat::Pretty => builder.pretty().finish().try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_config_deserializes_with_defaults() {
        let config: LoggingConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.file.is_none());
    }

    #[test]
    fn format_names_are_lowercase() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{"level": "debug", "format": "compact"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn repeated_initialization_does_not_panic() {
        let config = LoggingConfig::default();
        let _first = init_from_config(&config);
        let _second = init_from_config(&config);
    }

    #[test]
    fn file_output_initialization_yields_a_guard() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Compact,
            file: Some(std::env::temp_dir().join("kiln-logging-test.log")),
        };
        let _guard = init_from_config(&config);
    }
}
