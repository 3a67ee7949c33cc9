//! Configuration type definitions for Muster
//!
//! All types implement serde traits for JSON serialization and have sensible defaults.

use serde::{Deserialize, Serialize};

use crate::event::DEFAULT_QUEUE_CAPACITY;

/// Main configuration struct for Muster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging output configuration
    pub logging: LoggingConfig,
    /// Source watcher tuning
    pub watcher: WatcherConfig,
    /// Platform profile (managed service set)
    pub profile: ProfileConfig,
    /// Archive inclusion rules
    pub archive: crate::archive::InclusionRules,
    /// Vendor step toolchain settings
    pub vendor: crate::vendor::VendorConfig,
}

// ============================================================================
// Logging
// ============================================================================

/// Log output format
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, coloured
    Pretty,
    /// Compact single-line text
    #[default]
    Component,
    /// JSON lines for log aggregators
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "component" => Ok(Self::Component),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Optional file to append JSON logs to
    pub file: Option<String>,
    /// Default filter level when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            file: None,
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// Watcher
// ============================================================================

/// Source watcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatcherConfig {
    /// Capacity of the outbound event queue
    pub queue_capacity: usize,
    /// Capacity of the coalescing buffer (raw notifications beyond this are dropped)
    pub coalesce_capacity: usize,
    /// Delay after the first notification of a burst before emitting; 0 emits immediately
    pub debounce_ms: u64,
    /// Delay before retrying a failed watch re-registration
    pub recovery_interval_ms: u64,
    /// Ignore notifications that only report a read
    pub ignore_access: bool,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            coalesce_capacity: DEFAULT_QUEUE_CAPACITY,
            debounce_ms: 0,
            recovery_interval_ms: 1000,
            ignore_access: true,
        }
    }
}

// ============================================================================
// Profile
// ============================================================================

/// Core platform services reconciled together by the platform profile.
pub const PLATFORM_SERVICES: &[&str] = &[
    "config", "network", "runtime", "registry", "broker", "store", "router", "debug", "proxy",
    "api", "auth", "web",
];

/// Platform profile configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileConfig {
    /// Optional namespace; managed names become `<namespace>.<name>`
    pub namespace: Option<String>,
    /// Services reconciled whenever any signal arrives, in order
    pub services: Vec<String>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            services: PLATFORM_SERVICES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
