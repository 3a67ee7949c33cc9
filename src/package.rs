//! Source packaging: vendor (optional) then archive.
//!
//! A vendor directory created by this step is removed again once the
//! archive has been produced; a pre-existing one is left alone.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::archive::{ArchiveSummary, Archiver};
use crate::error::{MusterError, Result};
use crate::vendor::Vendor;

/// Name of the dependency snapshot directory the toolchain writes.
const VENDOR_DIR: &str = "vendor";

/// Archive bytes plus what went into them.
#[derive(Debug, Clone)]
pub struct Package {
    pub bytes: Vec<u8>,
    pub summary: ArchiveSummary,
}

/// Removes a generated directory on drop.
struct Cleanup(Option<PathBuf>);

impl Drop for Cleanup {
    fn drop(&mut self) {
        if let Some(dir) = self.0.take() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!(
                    dir = %dir.display(),
                    error = %e,
                    "Failed to remove generated vendor directory"
                );
            } else {
                debug!(dir = %dir.display(), "Removed generated vendor directory");
            }
        }
    }
}

/// Packs a source tree for remote building.
pub struct SourcePackager {
    archiver: Archiver,
    vendor: Option<Vendor>,
}

impl SourcePackager {
    pub fn new(archiver: Archiver) -> Self {
        Self {
            archiver,
            vendor: None,
        }
    }

    /// Vendors dependencies before archiving (builder pattern).
    pub fn with_vendor(mut self, vendor: Vendor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// Vendors (if configured) and archives `dir`.
    pub async fn package(&self, dir: &Path) -> Result<Package> {
        let vendor_dir = dir.join(VENDOR_DIR);
        let _cleanup = match &self.vendor {
            Some(vendor) => {
                let generated = !vendor_dir.exists();
                let guard = Cleanup(generated.then(|| vendor_dir.clone()));
                vendor.vendor(dir).await?;
                guard
            }
            None => Cleanup(None),
        };

        let archiver = self.archiver.clone();
        let root = dir.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<Package> {
            let mut bytes = Vec::new();
            let summary = archiver.archive_to(&root, &mut bytes)?;
            Ok(Package { bytes, summary })
        })
        .await
        .map_err(|e| MusterError::Runtime(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::unarchive;
    use crate::vendor::VendorConfig;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_package_without_vendor() {
        let src = tempdir().unwrap();
        std::fs::write(src.path().join("main.go"), b"package main\n").unwrap();

        let pkg = SourcePackager::new(Archiver::default())
            .package(src.path())
            .await
            .unwrap();
        assert_eq!(pkg.summary.files, 1);

        let dest = tempdir().unwrap();
        unarchive(pkg.bytes.as_slice(), dest.path()).unwrap();
        assert!(dest.path().join("main.go").exists());
    }

    #[cfg(unix)]
    fn fake_go(dir: &Path) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("go");
        std::fs::write(
            &path,
            concat!(
                "#!/bin/sh\n",
                "mkdir -p vendor/example.com/dep\n",
                "echo 'package dep' > vendor/example.com/dep/dep.go\n",
            ),
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_generated_vendor_is_archived_then_removed() {
        let tools = tempdir().unwrap();
        let src = tempdir().unwrap();
        std::fs::write(src.path().join("main.go"), b"package main\n").unwrap();

        let vendor = Vendor::with_toolchain(fake_go(tools.path()), &VendorConfig::default());
        let pkg = SourcePackager::new(Archiver::default())
            .with_vendor(vendor)
            .package(src.path())
            .await
            .unwrap();

        assert!(!src.path().join("vendor").exists());
        let dest = tempdir().unwrap();
        unarchive(pkg.bytes.as_slice(), dest.path()).unwrap();
        assert!(dest.path().join("vendor/example.com/dep/dep.go").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_existing_vendor_is_kept() {
        let tools = tempdir().unwrap();
        let src = tempdir().unwrap();
        std::fs::create_dir(src.path().join("vendor")).unwrap();
        std::fs::write(src.path().join("vendor/keep.txt"), b"mine").unwrap();

        let vendor = Vendor::with_toolchain(fake_go(tools.path()), &VendorConfig::default());
        SourcePackager::new(Archiver::default())
            .with_vendor(vendor)
            .package(src.path())
            .await
            .unwrap();

        assert!(src.path().join("vendor/keep.txt").exists());
    }
}
