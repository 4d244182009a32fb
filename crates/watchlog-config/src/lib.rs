pub mod config;
pub mod paths;

pub use config::{BackupConfig, Config, HistoryConfig, LoggingConfig, StorageConfig};
pub use paths::{container_base_path, PathManager};
