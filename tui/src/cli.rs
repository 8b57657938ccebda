//! Command Line Interface
//!
//! Flags override environment variables, which override the config file.

use std::path::PathBuf;

use clap::Parser;

use shift_sync_core::config::{default_config_path, load_config_from_path};
use shift_sync_core::{ConfigError, ConfigOverrides, SyncConfig};

/// shift-sync - copy your venue shift schedule into Google Calendar
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "shift-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Sync server base URL
    #[arg(short = 'u', long, value_name = "URL")]
    pub url: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long, env = "SHIFT_SYNC_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Google Calendar access token
    #[arg(long, env = "SHIFT_SYNC_GOOGLE_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Venue ID (e.g. SSE)
    #[arg(long, value_name = "ID")]
    pub venue: Option<String>,

    /// Venue user ID
    #[arg(long, value_name = "ID")]
    pub user: Option<String>,

    /// Venue PIN
    #[arg(long, env = "SHIFT_SYNC_PIN", value_name = "PIN", hide_env_values = true)]
    pub pin: Option<String>,

    /// Run one sync without the terminal UI and print each status update
    #[arg(long)]
    pub headless: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "SHIFT_SYNC_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Resolve configuration: flags, then environment, then file, then defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// the resolved values are invalid.
    pub fn resolve_config(&self) -> Result<SyncConfig, ConfigError> {
        let path = self.config.clone().or_else(default_config_path);
        let mut config = load_config_from_path(path)?;

        ConfigOverrides {
            base_url: self.url.clone(),
        }
        .apply(&mut config)?;

        Ok(config)
    }

    /// Flags that headless mode needs but were not given
    #[must_use]
    pub fn missing_headless_inputs(&self) -> Vec<&'static str> {
        [
            ("--token", &self.token),
            ("--venue", &self.venue),
            ("--user", &self.user),
            ("--pin", &self.pin),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(flag, _)| flag)
        .collect()
    }
}
