//! Configuration validation with unknown field detection.

use serde_json::Value;
use std::collections::HashSet;

use super::Config;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["logging", "watcher", "profile", "archive", "vendor"];

/// Known fields for each section.
const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    ("logging", &["format", "file", "level"]),
    (
        "watcher",
        &[
            "queue_capacity",
            "coalesce_capacity",
            "debounce_ms",
            "recovery_interval_ms",
            "ignore_access",
        ],
    ),
    ("profile", &["namespace", "services"]),
    (
        "archive",
        &[
            "vcs_prefixes",
            "snapshot_prefixes",
            "source_suffixes",
            "manifest_names",
            "text_suffixes",
        ],
    ),
    ("vendor", &["binary", "root_env", "path_env", "args", "env"]),
];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl Diagnostic {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    fn ok(message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Ok,
            path: String::new(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        prev = row;
    }
    prev[b.len()]
}

/// Suggest the closest known field name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

fn unknown_keys(
    obj: &serde_json::Map<String, Value>,
    known: &[&str],
    prefix: &str,
    out: &mut Vec<Diagnostic>,
) -> bool {
    let known_set: HashSet<&str> = known.iter().copied().collect();
    let mut found = false;
    for key in obj.keys() {
        if known_set.contains(key.as_str()) {
            continue;
        }
        found = true;
        let msg = match suggest_field(key, known) {
            Some(hint) => format!("Unknown field '{}', {}", key, hint),
            None => format!("Unknown field '{}'", key),
        };
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        out.push(Diagnostic::error(path, msg));
    }
    found
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic::error("", "Config must be a JSON object"));
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic::ok("Valid JSON"));

    let mut has_unknown = unknown_keys(obj, KNOWN_TOP_LEVEL, "", &mut diagnostics);
    for (section, known) in KNOWN_SECTIONS {
        if let Some(inner) = obj.get(*section).and_then(|v| v.as_object()) {
            has_unknown |= unknown_keys(inner, known, section, &mut diagnostics);
        }
    }

    if !has_unknown {
        diagnostics.push(Diagnostic::ok("All fields recognized"));
    }

    diagnostics
}

/// Semantic checks on a parsed config. Returns one message per problem.
pub fn validate_values(config: &Config) -> Vec<String> {
    let mut problems = Vec::new();

    if config.watcher.queue_capacity == 0 {
        problems.push("watcher.queue_capacity must be greater than zero".to_string());
    }
    if config.watcher.coalesce_capacity == 0 {
        problems.push("watcher.coalesce_capacity must be greater than zero".to_string());
    }
    if config.vendor.binary.trim().is_empty() {
        problems.push("vendor.binary must not be empty".to_string());
    }

    let mut seen = HashSet::new();
    for (i, name) in config.profile.services.iter().enumerate() {
        if name.trim().is_empty() {
            problems.push(format!("profile.services[{}] is empty", i));
        } else if !seen.insert(name.as_str()) {
            problems.push(format!("profile.services[{}]: duplicate '{}'", i, name));
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("watcher", "watcher"), 0);
        assert_eq!(levenshtein("wacher", "watcher"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_suggest_field() {
        assert_eq!(
            suggest_field("profle", KNOWN_TOP_LEVEL),
            Some("did you mean 'profile'?".to_string())
        );
        assert_eq!(suggest_field("zzzzzzzzzz", KNOWN_TOP_LEVEL), None);
    }

    #[test]
    fn test_validate_non_object() {
        let diags = validate_config(&json!([1, 2]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].level, DiagnosticLevel::Error);
    }

    #[test]
    fn test_validate_clean_config() {
        let diags = validate_config(&json!({"watcher": {"debounce_ms": 100}}));
        assert!(diags.iter().all(|d| d.level == DiagnosticLevel::Ok));
        assert!(diags.iter().any(|d| d.message == "All fields recognized"));
    }

    #[test]
    fn test_validate_unknown_nested_field() {
        let diags = validate_config(&json!({"watcher": {"debounse_ms": 100}}));
        let err = diags
            .iter()
            .find(|d| d.level == DiagnosticLevel::Error)
            .unwrap();
        assert_eq!(err.path, "watcher.debounse_ms");
        assert!(err.message.contains("debounce_ms"));
    }

    #[test]
    fn test_validate_values_default_ok() {
        assert!(validate_values(&Config::default()).is_empty());
    }

    #[test]
    fn test_validate_values_problems() {
        let mut cfg = Config::default();
        cfg.watcher.queue_capacity = 0;
        cfg.vendor.binary = " ".to_string();
        cfg.profile.services = vec!["api".into(), "".into(), "api".into()];
        let problems = validate_values(&cfg);
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("duplicate 'api'")));
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::error("vendor.bin", "Unknown field 'bin'");
        assert_eq!(d.to_string(), "[ERROR] vendor.bin: Unknown field 'bin'");
        assert_eq!(Diagnostic::ok("Valid JSON").to_string(), "[OK] Valid JSON");
    }
}
