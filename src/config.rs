//! Configuration management
//!
//! Config file is stored next to the executable as `config.toml`.
//! Persisted user selections live beside it in `settings.json` (see `settings`).

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_API_TIMEOUT_SECS, DEFAULT_FLUSH_INTERVAL_MS, DEFAULT_MAX_ENTRIES,
};
use crate::error::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

// =============================================================================
// Application Configuration
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub stream: StreamConfig,
    pub ui: UiConfig,
}

/// Cloud REST API access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; resources are requested as `{base_url}/{path}.json`
    pub base_url: String,
    /// Account name used for basic auth
    pub username: String,
    /// Account password or API key used for basic auth
    pub password: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

/// Streaming session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Maximum messages retained for display
    pub max_entries: usize,
    /// Buffer flush cadence
    pub flush_interval_ms: u64,
    /// Warn when an open stream is silent this long (0 = never)
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Render timestamps in UTC instead of local time
    pub show_timestamps_utc: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: DEFAULT_API_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// True when both halves of the basic-auth pair are present
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
            idle_timeout_secs: 0,
        }
    }
}

impl StreamConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Config {
    /// Reject values the session cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.stream.max_entries == 0 {
            return Err(StreamError::ConfigValidation {
                field: "stream.max_entries",
                reason: "must be greater than zero".into(),
            });
        }
        if self.api.base_url.trim().is_empty() {
            return Err(StreamError::ConfigValidation {
                field: "api.base_url",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Get the project root directory
///
/// Searches in order:
/// 1. Next to executable (production deployment)
/// 2. Up from target/release or target/debug (dev builds)
pub fn find_project_root() -> Result<PathBuf> {
    let exe = std::env::current_exe().map_err(|e| StreamError::ConfigRead {
        path: PathBuf::from("executable"),
        source: e,
    })?;
    let exe_dir = exe.parent().ok_or_else(|| StreamError::ConfigValidation {
        field: "exe_path",
        reason: "no parent directory".into(),
    })?;

    if exe_dir.join("config.toml").exists() {
        return Ok(exe_dir.to_path_buf());
    }

    // exe_dir = .../logstream/target/release, we want .../logstream
    if let Some(target_dir) = exe_dir.parent() {
        if target_dir
            .file_name()
            .map(|n| n == "target")
            .unwrap_or(false)
        {
            if let Some(project_root) = target_dir.parent() {
                if project_root.join("Cargo.toml").exists() {
                    return Ok(project_root.to_path_buf());
                }
            }
        }
    }

    Ok(exe_dir.to_path_buf())
}

/// Get the config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(find_project_root()?.join("config.toml"))
}

/// Parse config text, falling back to defaults for missing fields
pub fn parse(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).map_err(|e| StreamError::ConfigValidation {
        field: "config.toml",
        reason: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Load config from file, or create default if not exists
pub fn load() -> Config {
    let path = match config_path() {
        Ok(p) => p,
        Err(e) => {
            warn!("Failed to determine config path: {}, using defaults", e);
            return Config::default();
        }
    };

    if !path.exists() {
        let config = Config::default();
        if let Err(e) = save(&config) {
            warn!("Failed to create default config: {}", e);
        }
        return config;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match parse(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config error in {:?}: {}, using defaults", path, e);
                Config::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config {:?}: {}, using defaults", path, e);
            Config::default()
        }
    }
}

/// Save config to file
pub fn save(config: &Config) -> Result<()> {
    let path = config_path()?;
    let content =
        toml::to_string_pretty(config).map_err(|e| StreamError::ConfigValidation {
            field: "config",
            reason: e.to_string(),
        })?;
    fs::write(&path, content).map_err(|e| StreamError::ConfigRead { path, source: e })?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
