//! Configuration and document models
//!
//! - **profile**: the per-profile document (cards, tags, resume state)
//! - **app_config**: app-wide settings (recent profiles, theme)

pub mod app_config;
pub mod profile;

// Re-export commonly used types
pub use app_config::{AppConfig, RecentProfile, Theme};
pub use profile::{
    AppState, AppStatePatch, Card, CardPatch, CardTag, CardWithStatus, ProfileDocument, Tag,
    WindowState,
};
