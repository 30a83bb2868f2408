//! Image enumeration inside card folders
//!
//! Scans are non-recursive: only regular files directly inside the folder,
//! filtered by extension and sorted by file name.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::constants::images::EXTENSIONS;
use crate::error::ViewerError;
use crate::types::{ImageDimensions, ImageRef};

/// Image-enumeration capability consumed by the viewer
pub trait ImageSource {
    /// All supported images in `folder`, sorted by file name
    fn enumerate_images(&self, folder: &Path) -> Result<Vec<ImageRef>, ViewerError>;

    /// Original pixel size of an image
    fn image_dimensions(&self, image: &Path) -> Result<ImageDimensions>;

    /// First image by file name, used as a card's default thumbnail
    fn first_image(&self, folder: &Path) -> Result<Option<ImageRef>, ViewerError> {
        Ok(self.enumerate_images(folder)?.into_iter().next())
    }
}

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| EXTENSIONS.contains(&ext.as_str()))
}

/// Why a folder cannot be used, or `None` if it is a readable directory
pub fn folder_problem(folder: &Path) -> Option<String> {
    if !folder.exists() {
        Some(format!("Folder not found: {}", folder.display()))
    } else if !folder.is_dir() {
        Some(format!("Not a folder: {}", folder.display()))
    } else {
        None
    }
}

pub fn is_valid_folder(folder: &Path) -> bool {
    folder_problem(folder).is_none()
}

/// Local filesystem scanner
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageSource;

impl FsImageSource {
    fn scan(&self, folder: &Path) -> Result<Vec<PathBuf>, ViewerError> {
        if let Some(problem) = folder_problem(folder) {
            return Err(ViewerError::io(folder, problem));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(folder).min_depth(1).max_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                // The folder itself failing is fatal; a single bad entry is not
                Err(e) if e.depth() == 0 => {
                    return Err(ViewerError::io(folder, e.to_string()));
                }
                Err(e) => {
                    warn!(folder = %folder.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_file() && is_supported_image(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        debug!(folder = %folder.display(), count = files.len(), "Scanned folder");
        Ok(files)
    }
}

impl ImageSource for FsImageSource {
    fn enumerate_images(&self, folder: &Path) -> Result<Vec<ImageRef>, ViewerError> {
        Ok(self.scan(folder)?.into_iter().map(ImageRef::from_path).collect())
    }

    fn image_dimensions(&self, image: &Path) -> Result<ImageDimensions> {
        // Reads the header only; no full decode
        let (width, height) = image::image_dimensions(image)
            .with_context(|| format!("Failed to read image size of {}", image.display()))?;
        Ok(ImageDimensions { width, height })
    }
}
