//! Pack and unpack command handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};

use muster::config::Config;
use muster::{unarchive, Archiver, SourcePackager, Vendor};

/// Pack `dir` into `output`, vendoring first when asked.
pub(crate) async fn cmd_pack(dir: PathBuf, output: PathBuf, vendor: bool) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;

    let mut packager = SourcePackager::new(Archiver::new(config.archive.clone()));
    if vendor {
        let vendor = Vendor::new(&config.vendor).context("Failed to locate toolchain")?;
        packager = packager.with_vendor(vendor);
    }

    let package = packager
        .package(&dir)
        .await
        .with_context(|| format!("Failed to pack {}", dir.display()))?;

    tokio::fs::write(&output, &package.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let s = package.summary;
    println!(
        "Packed {} -> {} ({} files, {} directories, {} skipped, {} bytes)",
        dir.display(),
        output.display(),
        s.files,
        s.directories,
        s.skipped,
        s.bytes
    );
    Ok(())
}

/// Unpack `file` into `dest`.
pub(crate) async fn cmd_unpack(file: PathBuf, dest: PathBuf) -> Result<()> {
    let reader = std::fs::File::open(&file)
        .with_context(|| format!("Failed to open {}", file.display()))?;

    let target = dest.clone();
    tokio::task::spawn_blocking(move || unarchive(std::io::BufReader::new(reader), &target))
        .await
        .context("Unpack task failed")?
        .with_context(|| format!("Failed to unpack {}", file.display()))?;

    println!("Unpacked {} -> {}", file.display(), dest.display());
    Ok(())
}
