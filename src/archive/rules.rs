//! Which entries of a source tree go into an archive.

use serde::{Deserialize, Serialize};

/// Inclusion rules applied to paths relative to the archived directory.
///
/// Prefix rules are plain string prefixes of the relative path, so
/// `".git"` also excludes `.gitignore` and `.github/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InclusionRules {
    /// Entries starting with any of these are skipped entirely
    pub vcs_prefixes: Vec<String>,
    /// Files under these prefixes are always included (dependency snapshots)
    pub snapshot_prefixes: Vec<String>,
    /// Source file suffixes
    pub source_suffixes: Vec<String>,
    /// Manifest / lock file names, matched as path suffixes
    pub manifest_names: Vec<String>,
    /// Plain-text suffixes
    pub text_suffixes: Vec<String>,
}

impl Default for InclusionRules {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            vcs_prefixes: owned(&[".git"]),
            snapshot_prefixes: owned(&["vendor"]),
            source_suffixes: owned(&[".go"]),
            manifest_names: owned(&["go.mod", "go.sum"]),
            text_suffixes: owned(&[".txt"]),
        }
    }
}

impl InclusionRules {
    /// Whether an entry (file or directory) is skipped outright.
    pub fn is_excluded(&self, relative: &str) -> bool {
        starts_with_any(relative, &self.vcs_prefixes)
    }

    /// Whether a regular file is archived.
    pub fn includes_file(&self, relative: &str) -> bool {
        if self.is_excluded(relative) {
            return false;
        }
        starts_with_any(relative, &self.snapshot_prefixes)
            || ends_with_any(relative, &self.source_suffixes)
            || ends_with_any(relative, &self.manifest_names)
            || ends_with_any(relative, &self.text_suffixes)
    }
}

fn starts_with_any(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| path.starts_with(p.as_str()))
}

fn ends_with_any(path: &str, suffixes: &[String]) -> bool {
    suffixes.iter().any(|s| path.ends_with(s.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = InclusionRules::default();
        assert!(rules.includes_file("main.go"));
        assert!(rules.includes_file("cmd/server/main.go"));
        assert!(rules.includes_file("go.mod"));
        assert!(rules.includes_file("go.sum"));
        assert!(rules.includes_file("notes.txt"));
        assert!(rules.includes_file("vendor/github.com/x/y/LICENSE"));

        assert!(!rules.includes_file("README.md"));
        assert!(!rules.includes_file("bin/app"));
        assert!(!rules.includes_file(".git/config"));
    }

    #[test]
    fn test_vcs_prefix_is_string_prefix() {
        let rules = InclusionRules::default();
        assert!(rules.is_excluded(".git"));
        assert!(rules.is_excluded(".github/workflows"));
        assert!(rules.is_excluded(".gitignore"));
        assert!(!rules.is_excluded("src/.git"));
    }

    #[test]
    fn test_custom_rules() {
        let rules = InclusionRules {
            source_suffixes: vec![".rs".into()],
            manifest_names: vec!["Cargo.toml".into(), "Cargo.lock".into()],
            snapshot_prefixes: vec![],
            ..Default::default()
        };
        assert!(rules.includes_file("src/lib.rs"));
        assert!(rules.includes_file("Cargo.lock"));
        assert!(!rules.includes_file("main.go"));
        assert!(!rules.includes_file("vendor/a.c"));
    }
}
