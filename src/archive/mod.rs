//! Archive pipeline
//!
//! Packs a source directory into a tar stream for transport and unpacks a
//! received stream into a directory. Records are either directories (path
//! only) or regular files (path + content); anything else is rejected on
//! both sides.
//!
//! The producer walks depth-first with parents before children, and the
//! consumer relies on that order: a directory record must arrive before any
//! file beneath it.
//!
//! Both operations are synchronous; run them on a blocking-capable task.

mod rules;

pub use rules::InclusionRules;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{EntryType, HeaderMode};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{MusterError, Result};

/// Counts reported after packing a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub directories: usize,
    pub files: usize,
    /// Files left out by the inclusion rules
    pub skipped: usize,
    /// Total file content bytes
    pub bytes: u64,
}

/// Packs directories according to a set of inclusion rules.
#[derive(Debug, Clone, Default)]
pub struct Archiver {
    rules: InclusionRules,
}

impl Archiver {
    pub fn new(rules: InclusionRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &InclusionRules {
        &self.rules
    }

    /// Archives `dir` into an in-memory buffer.
    pub fn archive(&self, dir: &Path) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.archive_to(dir, &mut buf)?;
        Ok(buf)
    }

    /// Archives `dir` into `writer`.
    ///
    /// # Errors
    /// `MusterError::UnsupportedEntry` for symlinks and other special files
    /// that survive the VCS exclusion; I/O errors from the walk or the writer.
    pub fn archive_to<W: Write>(&self, dir: &Path, writer: W) -> Result<ArchiveSummary> {
        let mut builder = tar::Builder::new(writer);
        let mut summary = ArchiveSummary::default();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.rules.is_excluded(&relative_name(dir, e.path())));

        for entry in walker {
            let entry = entry?;
            let relative = relative_name(dir, entry.path());
            // Record the path as-is so names that are not UTF-8 survive.
            let record_path = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            let file_type = entry.file_type();

            if file_type.is_dir() {
                let meta = entry.metadata()?;
                let mut header = tar::Header::new_gnu();
                header.set_metadata_in_mode(&meta, HeaderMode::Deterministic);
                header.set_size(0);
                builder.append_data(&mut header, record_path, io::empty())?;
                summary.directories += 1;
                trace!(path = %relative, "Archived directory");
            } else if file_type.is_file() {
                if !self.rules.includes_file(&relative) {
                    summary.skipped += 1;
                    continue;
                }
                let meta = entry.metadata()?;
                let content = fs::read(entry.path())?;
                let mut header = tar::Header::new_gnu();
                header.set_metadata_in_mode(&meta, HeaderMode::Deterministic);
                header.set_size(content.len() as u64);
                builder.append_data(&mut header, record_path, content.as_slice())?;
                summary.files += 1;
                summary.bytes += content.len() as u64;
                trace!(path = %relative, bytes = content.len(), "Archived file");
            } else {
                let kind = if file_type.is_symlink() {
                    "symlink".to_string()
                } else {
                    "special file".to_string()
                };
                return Err(MusterError::UnsupportedEntry {
                    path: relative,
                    kind,
                });
            }
        }

        builder.finish()?;
        debug!(
            dir = %dir.display(),
            directories = summary.directories,
            files = summary.files,
            skipped = summary.skipped,
            bytes = summary.bytes,
            "Archive complete"
        );
        Ok(summary)
    }
}

/// Archives `dir` with the default inclusion rules.
pub fn archive(dir: &Path) -> Result<Vec<u8>> {
    Archiver::default().archive(dir)
}

/// Unpacks an archive stream into `dest`, creating `dest` if needed.
///
/// Directory records are created if missing; file records are written
/// (created or overwritten). Stops at the first error without rolling back
/// what was already written.
pub fn unarchive<R: Read>(src: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(src);
    let mut written = 0usize;
    fs::create_dir_all(dest)?;

    for entry in archive.entries()? {
        let mut entry = entry?;
        let relative = entry.path()?.into_owned();
        let target = safe_join(dest, &relative)?;
        let kind = entry.header().entry_type();

        if kind.is_dir() {
            if target.is_dir() {
                continue;
            }
            if target.exists() {
                return Err(MusterError::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} exists and is not a directory", relative.display()),
                )));
            }
            fs::create_dir(&target)?;
        } else if kind.is_file() {
            // The header size is untrusted; stream rather than pre-allocate.
            let mut file = fs::File::create(&target)?;
            io::copy(&mut entry, &mut file)?;
            written += 1;
        } else {
            return Err(MusterError::UnsupportedEntry {
                path: relative.display().to_string(),
                kind: entry_kind_name(kind),
            });
        }
    }

    debug!(dest = %dest.display(), files = written, "Unarchive complete");
    Ok(())
}

/// Relative path of `path` under `root`, `/`-separated, for rule matching
/// and logs.
fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Joins an archive path onto `dest`, refusing anything that escapes it.
fn safe_join(dest: &Path, relative: &Path) -> Result<PathBuf> {
    let mut target = dest.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => target.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(MusterError::UnsafePath(relative.display().to_string()));
            }
        }
    }
    Ok(target)
}

fn entry_kind_name(kind: EntryType) -> String {
    match kind {
        EntryType::Symlink => "symlink".to_string(),
        EntryType::Link => "hard link".to_string(),
        EntryType::Char => "character device".to_string(),
        EntryType::Block => "block device".to_string(),
        EntryType::Fifo => "fifo".to_string(),
        other => format!("type flag '{}'", other.as_byte() as char),
    }
}
