//! Logging Setup
//!
//! The TUI owns the terminal, so it logs to a file. Headless runs log to
//! stderr and keep stdout for status lines. `RUST_LOG` overrides `--log-level`.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Where log output goes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error
    Stderr,
    /// Append to a file
    File(PathBuf),
}

/// Default log file: `$XDG_CACHE_HOME/shift-sync/shift-sync.log`
#[must_use]
pub fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("shift-sync")
        .join("shift-sync.log")
}

/// Build the filter for our crates at `level`, unless `RUST_LOG` is set
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("shift_sync_tui={level},shift_sync_core={level}"))
    })
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(level: &str, target: &LogTarget) -> Result<()> {
    let filter = env_filter(level);

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {parent:?}"))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {path:?}"))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }

    Ok(())
}
