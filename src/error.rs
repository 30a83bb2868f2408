//! Error types for the profile store and the viewer

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by structural profile-store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No profile document is currently loaded
    #[error("No active profile")]
    NoActiveProfile,

    /// Card id is not present in the current document
    #[error("Card not found: {0}")]
    CardNotFound(String),

    /// Tag id is not present in the current document
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    /// Loading or saving a document (or the app config) failed
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    pub fn persistence(err: anyhow::Error) -> Self {
        // `{:#}` keeps the whole context chain on one line
        Self::Persistence(format!("{err:#}"))
    }
}

/// Session-scoped viewer errors. Never fatal to the rest of the app.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViewerError {
    /// Folder missing, not a directory, or unreadable
    #[error("Failed to read images in {}: {message}", folder.display())]
    Io { folder: PathBuf, message: String },

    /// Folder readable but holds no supported images
    #[error("No images in folder: {}", .0.display())]
    EmptyFolder(PathBuf),
}

impl ViewerError {
    pub fn io(folder: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Io {
            folder: folder.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_keeps_context_chain() {
        let err = anyhow::anyhow!("disk full").context("Failed to write profile");
        let store_err = StoreError::persistence(err);
        assert_eq!(
            store_err,
            StoreError::Persistence("Failed to write profile: disk full".to_string())
        );
    }

    #[test]
    fn test_viewer_error_messages() {
        let empty = ViewerError::EmptyFolder(PathBuf::from("/pics"));
        assert_eq!(empty.to_string(), "No images in folder: /pics");

        let io = ViewerError::io("/gone", "folder not found");
        assert_eq!(io.to_string(), "Failed to read images in /gone: folder not found");
    }
}
