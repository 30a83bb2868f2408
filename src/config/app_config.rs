//! App-wide settings shared by every profile
//!
//! Holds the most-recently-used profile list and the theme. Stored as JSON in
//! the platform config directory, independent of any profile document.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::profile::now_rfc3339;
use crate::constants::config;

/// Recently opened profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentProfile {
    pub path: String,
    /// File name without extension
    pub name: String,
    pub last_opened_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub recent_profiles: Vec<RecentProfile>,
    #[serde(default = "default_max_recent_profiles")]
    pub max_recent_profiles: usize,
    #[serde(default)]
    pub theme: Theme,
}

fn default_version() -> String {
    config::DOCUMENT_VERSION.to_string()
}

fn default_max_recent_profiles() -> usize {
    config::MAX_RECENT_PROFILES
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            recent_profiles: Vec::new(),
            max_recent_profiles: default_max_recent_profiles(),
            theme: Theme::default(),
        }
    }
}

/// Display name for a profile path: file stem, or "unknown"
pub fn profile_name(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

impl AppConfig {
    /// Default location: `<config_dir>/image-folder-viewer/app_config.json`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        path
    }

    /// Load from `path`. A missing or unreadable file yields defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "No app config found, using defaults");
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .with_context(|| format!("Failed to read app config from {}", path.display()))
            .and_then(|contents| {
                serde_json::from_str::<AppConfig>(&contents)
                    .with_context(|| format!("Failed to parse app config at {}", path.display()))
            });

        match parsed {
            Ok(config) => {
                info!(recent = config.recent_profiles.len(), "Loaded app config");
                config
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "App config unusable, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize app config")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write app config to {}", path.display()))?;

        info!(path = %path.display(), "Saved app config");
        Ok(())
    }

    /// Move `path` to the front of the recent list (deduplicated, capped)
    pub fn add_recent(&mut self, path: &str) {
        self.recent_profiles.retain(|p| p.path != path);
        self.recent_profiles.insert(
            0,
            RecentProfile {
                path: path.to_string(),
                name: profile_name(path),
                last_opened_at: now_rfc3339(),
            },
        );
        self.recent_profiles.truncate(self.max_recent_profiles);
    }

    /// Returns whether an entry was removed
    pub fn remove_recent(&mut self, path: &str) -> bool {
        let before = self.recent_profiles.len();
        self.recent_profiles.retain(|p| p.path != path);
        self.recent_profiles.len() != before
    }
}
