//! TOML Configuration File Support
//!
//! Loads client configuration from `~/.config/shift-sync/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller through [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [endpoint]
//! base_url = "https://shift-sync.example.com"
//! connect_timeout_ms = 10000
//!
//! [stream]
//! channel_capacity = 64
//! max_frame_bytes = 1048576
//!
//! [ui]
//! idle_message = "Ready to Sync"
//! ```
//!
//! There is intentionally no stream read timeout: a sync stays open as long
//! as the remote job keeps the connection alive. Memory per sync is bounded
//! by `max_frame_bytes`: a frame growing past it without a terminator is
//! dropped and reported as malformed.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decoder::DEFAULT_MAX_FRAME_BYTES;

/// Default job server address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Status text shown before any sync has started
pub const DEFAULT_IDLE_MESSAGE: &str = "Ready to Sync";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Endpoint section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointToml {
    /// Job server base URL
    pub base_url: Option<String>,

    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,
}

/// Stream section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamToml {
    /// Chunks buffered between the reader task and the orchestrator
    pub channel_capacity: Option<usize>,

    /// Largest unterminated frame kept in memory, in bytes
    pub max_frame_bytes: Option<usize>,
}

/// UI section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiToml {
    /// Status text shown before the first sync
    pub idle_message: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncToml {
    /// Endpoint configuration section
    pub endpoint: EndpointToml,

    /// Stream configuration section
    pub stream: StreamToml,

    /// UI configuration section
    pub ui: UiToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved client configuration
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Job server base URL
    pub base_url: String,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Chunks buffered between the reader task and the orchestrator
    pub channel_capacity: usize,

    /// Largest unterminated frame kept in memory, in bytes
    pub max_frame_bytes: usize,

    /// Status text shown before the first sync
    pub idle_message: String,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Highest-priority source that contributed a value
    source: ConfigSource,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            channel_capacity: 64,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            idle_message: DEFAULT_IDLE_MESSAGE.to_string(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl SyncConfig {
    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty URL, a URL
    /// without an http(s) scheme, a zero channel capacity, or a zero frame
    /// limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::ValidationError(
                "endpoint.base_url must not be empty".to_string(),
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "endpoint.base_url must start with http:// or https:// (got {url})"
            )));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "stream.channel_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "stream.max_frame_bytes must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Values supplied on the command line
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Job server base URL
    pub base_url: Option<String>,
}

impl ConfigOverrides {
    /// Apply CLI values on top of a loaded configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the result is invalid.
    pub fn apply(&self, config: &mut SyncConfig) -> Result<(), ConfigError> {
        if let Some(ref url) = self.base_url {
            config.base_url = url.clone();
            config.source = ConfigSource::Cli;
        }
        config.validate()
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/shift-sync/config.toml` or
/// `~/.config/shift-sync/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("shift-sync").join("config.toml"))
}

/// Load configuration from the default path and the process environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting values are invalid. A missing file is not an error.
pub fn load_config() -> Result<SyncConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting values are invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<SyncConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration using `env` to look up environment variables
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<SyncConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Start with defaults
    let mut config = SyncConfig::default();

    // Try to load from file
    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: SyncToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Apply environment variables (overrides file values)
    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut SyncConfig, toml: &SyncToml) {
    if let Some(ref url) = toml.endpoint.base_url {
        config.base_url = url.clone();
    }
    if let Some(timeout) = toml.endpoint.connect_timeout_ms {
        config.connect_timeout = Duration::from_millis(timeout);
    }
    if let Some(capacity) = toml.stream.channel_capacity {
        config.channel_capacity = capacity;
    }
    if let Some(max) = toml.stream.max_frame_bytes {
        config.max_frame_bytes = max;
    }
    if let Some(ref message) = toml.ui.idle_message {
        config.idle_message = message.clone();
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut SyncConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("SHIFT_SYNC_URL") {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = env("SHIFT_SYNC_CONNECT_TIMEOUT_MS") {
        match timeout.parse::<u64>() {
            Ok(ms) => {
                config.connect_timeout = Duration::from_millis(ms);
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid SHIFT_SYNC_CONNECT_TIMEOUT_MS"),
        }
    }
    if let Some(capacity) = env("SHIFT_SYNC_CHANNEL_CAPACITY") {
        match capacity.parse::<usize>() {
            Ok(n) => {
                config.channel_capacity = n;
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %capacity, "Ignoring invalid SHIFT_SYNC_CHANNEL_CAPACITY"),
        }
    }
    if let Some(max) = env("SHIFT_SYNC_MAX_FRAME_BYTES") {
        match max.parse::<usize>() {
            Ok(n) => {
                config.max_frame_bytes = n;
                config.source = ConfigSource::Env;
            }
            Err(_) => tracing::warn!(value = %max, "Ignoring invalid SHIFT_SYNC_MAX_FRAME_BYTES"),
        }
    }
}
