//! Vendor step
//!
//! Runs the dependency toolchain's vendor subcommand in a source directory
//! so the archived tree builds without network access.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{MusterError, Result};

/// Toolchain settings for the vendor step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct VendorConfig {
    /// Executable name of the toolchain
    pub binary: String,
    /// Environment variable naming the toolchain's installation root
    pub root_env: String,
    /// Search-path environment variable
    pub path_env: String,
    /// Arguments for the vendor subcommand
    pub args: Vec<String>,
    /// Extra environment for the invocation
    pub env: BTreeMap<String, String>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            binary: "go".to_string(),
            root_env: "GOROOT".to_string(),
            path_env: "PATH".to_string(),
            args: vec!["mod".to_string(), "vendor".to_string()],
            env: BTreeMap::from([("GO111MODULE".to_string(), "auto".to_string())]),
        }
    }
}

impl VendorConfig {
    /// Locates the toolchain from the process environment.
    ///
    /// The installation root wins when set (without checking the binary
    /// exists); otherwise the search path is scanned, then `which` as a
    /// last resort.
    pub fn locate(&self) -> Result<PathBuf> {
        self.locate_with(
            std::env::var_os(&self.root_env),
            std::env::var_os(&self.path_env),
        )
    }

    /// Locates the toolchain from explicit root / search-path values.
    pub fn locate_with(&self, root: Option<OsString>, search: Option<OsString>) -> Result<PathBuf> {
        if let Some(root) = root.filter(|r| !r.is_empty()) {
            return Ok(PathBuf::from(root).join("bin").join(&self.binary));
        }

        if let Some(search) = search {
            for dir in std::env::split_paths(&search) {
                let candidate = dir.join(&self.binary);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
            return which::which_in(&self.binary, Some(&search), Path::new("."))
                .map_err(|e| MusterError::ToolchainNotFound(format!("{}: {}", self.binary, e)));
        }

        which::which(&self.binary)
            .map_err(|e| MusterError::ToolchainNotFound(format!("{}: {}", self.binary, e)))
    }
}

/// Runs the vendor subcommand with a located toolchain.
#[derive(Debug, Clone)]
pub struct Vendor {
    toolchain: PathBuf,
    config: VendorConfig,
}

impl Vendor {
    /// Locates the toolchain described by `config`.
    ///
    /// # Errors
    /// `MusterError::ToolchainNotFound` if no executable can be found.
    pub fn new(config: &VendorConfig) -> Result<Self> {
        let toolchain = config.locate()?;
        info!(toolchain = %toolchain.display(), "Located toolchain");
        Ok(Self::with_toolchain(toolchain, config))
    }

    /// Uses an explicit toolchain executable.
    pub fn with_toolchain(toolchain: impl Into<PathBuf>, config: &VendorConfig) -> Self {
        Self {
            toolchain: toolchain.into(),
            config: config.clone(),
        }
    }

    pub fn toolchain(&self) -> &Path {
        &self.toolchain
    }

    /// Vendors dependencies of the module in `dir`.
    ///
    /// # Errors
    /// `MusterError::VendorExecution` when the toolchain cannot be started or
    /// exits non-zero; the error carries the captured standard error.
    pub async fn vendor(&self, dir: &Path) -> Result<()> {
        debug!(
            dir = %dir.display(),
            toolchain = %self.toolchain.display(),
            args = ?self.config.args,
            "Vendoring dependencies"
        );

        let mut cmd = Command::new(&self.toolchain);
        cmd.args(&self.config.args)
            .current_dir(dir)
            .envs(&self.config.env)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let output = cmd.output().await.map_err(|e| MusterError::VendorExecution {
            error: e.to_string(),
            output: String::new(),
        })?;

        if !output.status.success() {
            return Err(MusterError::VendorExecution {
                error: output.status.to_string(),
                output: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            });
        }

        info!(dir = %dir.display(), "Dependencies vendored");
        Ok(())
    }
}
