//! Error types for Muster
//!
//! This module defines all error types used throughout the orchestration core.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for Muster operations.
#[derive(Error, Debug)]
pub enum MusterError {
    /// Operation attempted on a watcher (or notifier) that has been closed.
    /// Recover by constructing a new instance.
    #[error("Notifier closed")]
    Closed,

    /// The initial filesystem watch could not be created or registered.
    /// Fatal for the instance that raised it.
    #[error("Watch init error: {0}")]
    WatchInit(String),

    /// An archive contains (or a source tree yields) an entry type that
    /// cannot be materialized.
    #[error("Unsupported entry type {kind} at {path}")]
    UnsupportedEntry {
        /// Relative path of the offending entry
        path: String,
        /// Human readable entry type (e.g. "symlink")
        kind: String,
    },

    /// An archive record would be written outside the destination directory.
    #[error("Unsafe archive path: {0}")]
    UnsafePath(String),

    /// The dependency-resolution toolchain could not be located.
    #[error("Toolchain not found: {0}")]
    ToolchainNotFound(String),

    /// The toolchain ran but failed. `output` carries the captured diagnostics.
    #[error("Vendor failed: {error}: {output}")]
    VendorExecution {
        /// Process-level error (exit status or spawn failure)
        error: String,
        /// Captured standard error of the toolchain
        output: String,
    },

    /// No async runtime is available to host a background task.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Configuration-related errors (invalid values, unreadable files, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MusterError {
    /// Returns `true` if the error means the instance was closed.
    pub fn is_closed(&self) -> bool {
        matches!(self, MusterError::Closed)
    }

    /// Returns `true` if the instance that raised this error can never be used again.
    ///
    /// Archive and vendor failures only abort the current operation; a retry
    /// with fixed input or environment may succeed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MusterError::Closed | MusterError::WatchInit(_))
    }
}

impl From<walkdir::Error> for MusterError {
    fn from(err: walkdir::Error) -> Self {
        match err.into_io_error() {
            Some(io) => MusterError::Io(io),
            None => MusterError::Io(std::io::Error::other("filesystem loop detected")),
        }
    }
}

/// A specialized `Result` type for Muster operations.
pub type Result<T> = std::result::Result<T, MusterError>;
