//! Log subscriber setup
//!
//! Level comes from `--log-level`, then the `LOG_LEVEL` environment variable,
//! then `info`. A `RUST_LOG` filter, when set, replaces all of these.

use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Parse a level name; anything unrecognised is `info`
pub fn level_from_name(name: &str) -> Level {
    match name.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

pub fn resolve_level(cli_level: Option<&str>) -> Level {
    match cli_level {
        Some(name) => level_from_name(name),
        None => level_from_name(&std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())),
    }
}

/// Install the global subscriber, writing to stderr
pub fn init(cli_level: Option<&str>) -> Result<()> {
    let level = resolve_level(cli_level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}
