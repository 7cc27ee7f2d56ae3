//! Persisted user selections
//!
//! Stored as `settings.json` beside `config.toml`. Unlike the config file this
//! is rewritten by the tool whenever the user changes a selection.

use crate::cloud::SiteEnvironmentCache;
use crate::config::find_project_root;
use crate::error::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Last selected site
    pub sitename: String,
    /// Last selected environment
    pub environment: String,
    /// Enabled flag per togglable category
    pub logtypes: BTreeMap<String, bool>,
    /// "Only mine" tracking
    pub onlyme: bool,
    /// Show the tool's debug messages
    pub show_debug: bool,
    /// Content filter text
    pub regex: String,
    #[serde(rename = "sitelist")]
    pub cache: SiteEnvironmentCache,
}

/// Get the settings file path
pub fn settings_path() -> Result<PathBuf> {
    Ok(find_project_root()?.join("settings.json"))
}

impl Settings {
    /// Load from `path`, falling back to defaults on any problem
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::read(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| StreamError::Settings {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| StreamError::SettingsFormat {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| StreamError::SettingsFormat {
                path: path.to_path_buf(),
                source: e,
            })?;
        fs::write(path, content).map_err(|e| StreamError::Settings {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
