//! Durable storage for profile documents and the app config
//!
//! The profile store only talks to [`PersistenceBridge`]; the JSON file
//! implementation lives here so tests can swap in an in-memory one.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::profile::now_rfc3339;
use crate::config::{AppConfig, ProfileDocument};
use crate::constants::config;

pub trait PersistenceBridge {
    fn load_profile_document(&self, path: &Path) -> Result<ProfileDocument>;

    /// Write `doc` to `path`. Implementations stamp `updatedAt` at write time.
    fn save_profile_document(&self, path: &Path, doc: &ProfileDocument) -> Result<()>;

    /// Create and write a fresh document. Fails if `path` already exists.
    fn create_profile_document(&self, path: &Path) -> Result<ProfileDocument>;

    fn load_app_config(&self) -> Result<AppConfig>;

    fn save_app_config(&self, app_config: &AppConfig) -> Result<()>;
}

/// Append `.ivprofile` unless the path already carries it
pub fn normalize_profile_path(path: &Path) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext == config::PROFILE_EXTENSION => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".");
            name.push(config::PROFILE_EXTENSION);
            PathBuf::from(name)
        }
    }
}

/// Pretty-printed JSON files on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    config_path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Persistence rooted at the platform config directory
    pub fn with_default_config() -> Self {
        Self::new(AppConfig::default_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

impl PersistenceBridge for JsonFilePersistence {
    fn load_profile_document(&self, path: &Path) -> Result<ProfileDocument> {
        if !path.exists() {
            bail!("Profile not found: {}", path.display());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read profile {}", path.display()))?;
        let doc: ProfileDocument = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse profile {}", path.display()))?;

        info!(path = %path.display(), cards = doc.cards.len(), "Loaded profile");
        Ok(doc)
    }

    fn save_profile_document(&self, path: &Path, doc: &ProfileDocument) -> Result<()> {
        let mut stamped = doc.clone();
        stamped.updated_at = now_rfc3339();

        let json = serde_json::to_string_pretty(&stamped).context("Failed to serialize profile")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write profile {}", path.display()))?;

        info!(path = %path.display(), cards = doc.cards.len(), "Saved profile");
        Ok(())
    }

    fn create_profile_document(&self, path: &Path) -> Result<ProfileDocument> {
        if path.exists() {
            bail!("File already exists: {}", path.display());
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            bail!("Parent directory does not exist: {}", parent.display());
        }

        let doc = ProfileDocument::default();
        self.save_profile_document(path, &doc)?;
        Ok(doc)
    }

    fn load_app_config(&self) -> Result<AppConfig> {
        Ok(AppConfig::load_or_default(&self.config_path))
    }

    fn save_app_config(&self, app_config: &AppConfig) -> Result<()> {
        app_config.save(&self.config_path)
    }
}
