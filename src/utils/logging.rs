//! Logging initialization for Muster.
//!
//! Supports three formats:
//! - `pretty`: multi-line human-readable output
//! - `component`: compact single-line `timestamp LEVEL target: message {fields}`
//! - `json`: structured JSON lines, to stderr or appended to `logging.file`
//!
//! Logs always go to stderr (or the log file) so `muster watch` can print
//! event lines on stdout.

use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{MusterError, Result};

/// Builds the level filter: `RUST_LOG` wins, otherwise `cfg.level`.
fn filter_for(cfg: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level))
}

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
///
/// # Errors
/// `MusterError::Io` if the log file cannot be opened, `MusterError::Runtime`
/// if a global subscriber is already installed.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let filter = filter_for(cfg);

    let installed = match (cfg.format, &cfg.file) {
        (LogFormat::Json, Some(path)) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        (LogFormat::Json, None) => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        (LogFormat::Pretty, _) => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        (LogFormat::Component, _) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .compact()
            .try_init(),
    };

    installed.map_err(|e| MusterError::Runtime(format!("logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_fails_second_time() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LoggingConfig {
            format: LogFormat::Json,
            file: Some(dir.path().join("muster.log").display().to_string()),
            level: "debug".to_string(),
        };
        // Another test in this binary may have installed a subscriber first;
        // either way the second call must fail.
        let _ = init_logging(&cfg);
        assert!(matches!(init_logging(&cfg), Err(MusterError::Runtime(_))));
        assert!(dir.path().join("muster.log").exists());
    }

    #[test]
    fn test_unwritable_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = LoggingConfig {
            format: LogFormat::Json,
            file: Some(dir.path().join("missing/muster.log").display().to_string()),
            level: "info".to_string(),
        };
        assert!(matches!(init_logging(&cfg), Err(MusterError::Io(_))));
    }
}
