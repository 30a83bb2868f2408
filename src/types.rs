//! Shared value types: geometry, image references and pages

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants::window;

/// A size in logical (scale-independent) pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Both edges within `tolerance` of `other`
    pub fn approx_eq(&self, other: &LogicalSize, tolerance: f64) -> bool {
        (self.width - other.width).abs() <= tolerance
            && (self.height - other.height).abs() <= tolerance
    }
}

/// Window geometry as reported by the host, in physical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Physical pixels per logical pixel
    pub scale: f64,
}

impl WindowGeometry {
    pub fn logical_size(&self) -> LogicalSize {
        let scale = sanitize_scale(self.scale);
        LogicalSize::new(self.width as f64 / scale, self.height as f64 / scale)
    }
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: window::DEFAULT_WIDTH,
            height: window::DEFAULT_HEIGHT,
            scale: window::DEFAULT_SCALE,
        }
    }
}

/// Usable area of the monitor holding the window, in physical pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorWorkArea {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

impl MonitorWorkArea {
    pub fn logical_size(&self) -> LogicalSize {
        let scale = sanitize_scale(self.scale);
        LogicalSize::new(self.width as f64 / scale, self.height as f64 / scale)
    }
}

fn sanitize_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        window::DEFAULT_SCALE
    }
}

/// Original pixel dimensions of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// A single image inside a card's folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub path: PathBuf,
    pub filename: String,
}

impl ImageRef {
    pub fn from_path(path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, filename }
    }
}

/// Top-level page the app is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    #[default]
    Index,
    Viewer,
}
