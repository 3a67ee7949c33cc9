//! Configuration management for Muster
//!
//! Configuration is loaded from `~/.muster/config.json` with environment variable overrides.

mod types;
pub mod validate;

pub use types::*;

use crate::error::{MusterError, Result};
use crate::mux::ManagedSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

impl Config {
    /// Returns the Muster configuration directory path (~/.muster)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".muster")
    }

    /// Returns the path to the config file (~/.muster/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from the default path with environment overrides.
    ///
    /// If the config file doesn't exist, returns default configuration.
    /// Environment variables can override config values using the pattern:
    /// `MUSTER_SECTION_KEY`
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::path())
    }

    /// Load configuration from a specific path with environment overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Rejects values that would make a component unusable.
    pub fn validate(&self) -> Result<()> {
        let problems = validate::validate_values(self);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(MusterError::Config(problems.join("; ")))
        }
    }

    /// Apply environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_with(|key| std::env::var(key).ok());
    }

    fn apply_env_overrides_with(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Logging
        if let Some(val) = var("MUSTER_LOGGING_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("MUSTER_LOGGING_FILE") {
            self.logging.file = Some(val);
        }
        override_parsed(&var, "MUSTER_LOGGING_FORMAT", &mut self.logging.format);

        // Watcher
        override_parsed(&var, "MUSTER_WATCHER_QUEUE_CAPACITY", &mut self.watcher.queue_capacity);
        override_parsed(
            &var,
            "MUSTER_WATCHER_COALESCE_CAPACITY",
            &mut self.watcher.coalesce_capacity,
        );
        override_parsed(&var, "MUSTER_WATCHER_DEBOUNCE_MS", &mut self.watcher.debounce_ms);
        override_parsed(
            &var,
            "MUSTER_WATCHER_RECOVERY_INTERVAL_MS",
            &mut self.watcher.recovery_interval_ms,
        );
        override_parsed(&var, "MUSTER_WATCHER_IGNORE_ACCESS", &mut self.watcher.ignore_access);

        // Profile
        if let Some(val) = var("MUSTER_PROFILE_NAMESPACE") {
            self.profile.namespace = if val.is_empty() { None } else { Some(val) };
        }
        if let Some(val) = var("MUSTER_PROFILE_SERVICES") {
            self.profile.services = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        // Vendor
        if let Some(val) = var("MUSTER_VENDOR_BINARY") {
            self.vendor.binary = val;
        }
    }
}

fn override_parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T) {
    if let Some(val) = var(key) {
        if let Ok(v) = val.parse() {
            *slot = v;
        }
    }
}

impl ProfileConfig {
    /// Builds the managed set, applying the namespace prefix when one is set.
    pub fn managed_set(&self) -> ManagedSet {
        match self.namespace.as_deref() {
            Some(ns) if !ns.is_empty() => ManagedSet::new(
                self.services
                    .iter()
                    .map(|s| format!("{}.{}", ns, s))
                    .collect::<Vec<_>>(),
            ),
            _ => ManagedSet::new(self.services.clone()),
        }
    }
}
