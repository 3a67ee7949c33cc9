//! Vendor command handler.

use std::path::PathBuf;

use anyhow::{Context, Result};

use muster::config::Config;
use muster::Vendor;

pub(crate) async fn cmd_vendor(dir: PathBuf) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    let vendor = Vendor::new(&config.vendor).context("Failed to locate toolchain")?;

    vendor
        .vendor(&dir)
        .await
        .with_context(|| format!("Failed to vendor {}", dir.display()))?;

    println!("Vendored dependencies in {}", dir.display());
    Ok(())
}
