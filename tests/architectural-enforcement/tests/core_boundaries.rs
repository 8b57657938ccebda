//! Integration Test: Sync Core Boundaries
//!
//! **Policy**: `sync/core` is headless. It must not depend on a terminal
//! library, must not block the runtime, and reads the config file only
//! before the runtime needs it.

use architectural_enforcement::{scan, workspace_root, Violation};

fn report(title: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n{title}");
    for violation in violations {
        eprintln!("  {violation}");
    }
    panic!("Found {} violation(s)", violations.len());
}

#[test]
fn test_core_sources_exist() {
    assert!(workspace_root().join("sync/core/src/lib.rs").exists());
}

#[test]
fn test_core_has_no_ui_dependencies() {
    let violations = scan("sync/core/src", &["ratatui", "crossterm"], &[]);
    report("Sync core must stay UI-agnostic:", &violations);
}

#[test]
fn test_no_blocking_calls_in_async_code() {
    let patterns = ["std::thread::sleep", "reqwest::blocking"];
    let mut violations = scan("sync/core/src", &patterns, &[]);
    violations.extend(scan("tui/src", &patterns, &[]));
    report("Blocking calls found in async code:", &violations);
}

#[test]
fn test_core_file_io_only_in_config() {
    let violations = scan("sync/core/src", &["std::fs"], &["config.rs"]);
    report("Blocking file I/O outside config loading:", &violations);
}
