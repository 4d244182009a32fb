pub mod clear;
pub mod config;
pub mod episodes;
pub mod export;
pub mod history;
pub mod import;
pub mod lists;
pub mod validate;
pub mod watch;

use color_eyre::eyre::Context;
use color_eyre::Result;
use watchlog_config::{Config, PathManager};
use watchlog_core::{JsonFileStore, StoreLock, ValidationOptions};
use watchlog_models::parse_timestamp;

/// Resolved paths and configuration shared by every command
pub struct AppContext {
    pub paths: PathManager,
    pub config: Config,
}

impl AppContext {
    pub fn new(paths: PathManager, config: Config) -> Self {
        Self { paths, config }
    }

    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.paths.data_dir())
    }

    /// Lock file over the data directory; every command that writes takes it
    pub fn store_lock(&self) -> Result<StoreLock> {
        StoreLock::open(self.paths.data_dir()).wrap_err("Failed to open the data directory lock")
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            allow_missing_collections: self.config.backup.allow_missing_collections,
        }
    }
}

/// Render a stored timestamp for tables, keeping unparseable values visible as-is
pub fn display_time(value: &str) -> String {
    parse_timestamp(value)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| value.to_string())
}

pub fn display_progress(position: f64, duration: f64) -> String {
    if duration > 0.0 {
        format!("{:.0}%", (position / duration * 100.0).clamp(0.0, 100.0))
    } else {
        "-".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_time() {
        assert_eq!(display_time("2024-03-01T21:05:09.120Z"), "2024-03-01 21:05");
        assert_eq!(display_time("yesterday"), "yesterday");
    }

    #[test]
    fn test_display_progress() {
        assert_eq!(display_progress(30.0, 120.0), "25%");
        assert_eq!(display_progress(500.0, 120.0), "100%");
        assert_eq!(display_progress(10.0, 0.0), "-");
    }
}
