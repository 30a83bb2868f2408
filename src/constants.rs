//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Zoom behaviour for the viewer window
pub mod zoom {
    /// Identity zoom (image shown at its fitted size)
    pub const IDENTITY: f64 = 1.0;

    /// Upper bound for any zoom level, fitted or requested
    pub const MAX_LEVEL: f64 = 4.0;

    /// Lower bound for a fitted level; huge images would otherwise round to 0
    pub const MIN_LEVEL: f64 = 0.01;

    /// Multiplier applied per zoom-in step
    pub const IN_FACTOR: f64 = 1.2;

    /// Multiplier applied per zoom-out step
    pub const OUT_FACTOR: f64 = 0.83;

    /// Smallest window edge (logical pixels) a zoom-out may produce
    pub const MIN_WINDOW_EDGE: f64 = 200.0;

    /// Tolerance (logical pixels) when matching an observed resize against a
    /// pending programmatic request. Hosts round sizes to whole physical pixels.
    pub const RESIZE_MATCH_TOLERANCE: f64 = 1.0;
}

/// Window defaults used when the host cannot report geometry
pub mod window {
    pub const DEFAULT_WIDTH: u32 = 1280;
    pub const DEFAULT_HEIGHT: u32 = 800;
    pub const DEFAULT_SCALE: f64 = 1.0;
}

/// Image enumeration
pub mod images {
    /// Supported image extensions (matched case-insensitively)
    pub const EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
}

/// File locations and formats
pub mod config {
    /// Directory name under the platform config dir
    pub const APP_DIR: &str = "image-folder-viewer";

    /// App-wide settings file name
    pub const FILENAME: &str = "app_config.json";

    /// Profile document extension (without the dot)
    pub const PROFILE_EXTENSION: &str = "ivprofile";

    /// Version string written into new documents
    pub const DOCUMENT_VERSION: &str = "1.0";

    /// Default cap for the recent-profiles list
    pub const MAX_RECENT_PROFILES: usize = 10;
}
