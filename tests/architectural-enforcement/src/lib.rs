//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The sync core stays UI-agnostic
//! - No thread sleeps or blocking HTTP in async code
//!
//! The checks are plain source scans so they run without building the
//! crates they inspect.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, two levels above this package
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// One forbidden pattern found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File, relative to the workspace root
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The offending pattern
    pub pattern: &'static str,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} uses `{}`", self.path.display(), self.line, self.pattern)
    }
}

/// Scan every `.rs` file under `dir` (relative to the workspace root)
///
/// Comment lines are skipped, and scanning of a file stops at its
/// `#[cfg(test)]` module. Files named in `allowed` are skipped entirely.
#[must_use]
pub fn scan(dir: &str, patterns: &[&'static str], allowed: &[&str]) -> Vec<Violation> {
    let root = workspace_root();
    let mut violations = Vec::new();

    for entry in walkdir::WalkDir::new(root.join(dir))
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("rs") {
            continue;
        }
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or_default();
        if allowed.contains(&name) {
            continue;
        }
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };

        let relative = path.strip_prefix(&root).unwrap_or(path).to_path_buf();
        violations.extend(scan_source(&relative, &content, patterns));
    }

    violations
}

/// Scan one file's contents
#[must_use]
pub fn scan_source(path: &Path, content: &str, patterns: &[&'static str]) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.starts_with("#[cfg(test)]") {
            break;
        }
        if trimmed.starts_with("//") {
            continue;
        }
        let code = trimmed.split("//").next().unwrap_or(trimmed);

        for pattern in patterns {
            if code.contains(pattern) {
                violations.push(Violation {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    pattern,
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_source_skips_comments_and_tests() {
        let source = "\
use tokio::time::sleep;
// std::thread::sleep is banned
let x = 1; // reqwest::blocking in a trailing comment
std::thread::sleep(d);
#[cfg(test)]
mod tests { std::thread::sleep(d); }
";
        let found = scan_source(Path::new("a.rs"), source, &["std::thread::sleep", "reqwest::blocking"]);
        assert_eq!(
            found,
            vec![Violation {
                path: PathBuf::from("a.rs"),
                line: 4,
                pattern: "std::thread::sleep",
            }]
        );
    }
}
