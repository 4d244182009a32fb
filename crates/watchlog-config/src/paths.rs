use anyhow::Result;
use std::path::{Path, PathBuf};

/// Get the container base path from environment variable, defaulting to "/app"
pub fn container_base_path() -> PathBuf {
    std::env::var("WATCHLOG_BASE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/app"))
}

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
    log_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("watchlog");

        Ok(Self::from_base(base_dir))
    }

    /// Config at the base, data and logs in subdirectories
    pub fn from_base(base: PathBuf) -> Self {
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
            log_dir: base.join("logs"),
        }
    }

    pub fn from_env() -> Self {
        Self::from_base(container_base_path())
    }

    /// Point the data directory somewhere else (from `[storage] data_dir`)
    pub fn with_data_dir(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join("backups")
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.log_dir.join("watchlog.log")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        // An explicit base path wins over platform directories
        if std::env::var_os("WATCHLOG_BASE_PATH").is_some() {
            return Self::from_env();
        }

        // Otherwise, use platform-specific paths (e.g., ~/.config/watchlog on Linux)
        Self::new().unwrap_or_else(|_| Self::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_under_base() {
        let paths = PathManager::from_base(PathBuf::from("/tmp/wl"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/wl/config.toml"));
        assert_eq!(paths.data_dir(), Path::new("/tmp/wl/data"));
        assert_eq!(paths.backups_dir(), PathBuf::from("/tmp/wl/data/backups"));
        assert_eq!(paths.default_log_file(), PathBuf::from("/tmp/wl/logs/watchlog.log"));
    }

    #[test]
    fn test_data_dir_override() {
        let paths = PathManager::from_base(PathBuf::from("/tmp/wl")).with_data_dir(Some(PathBuf::from("/srv/history")));
        assert_eq!(paths.data_dir(), Path::new("/srv/history"));
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/wl/config.toml"));

        let unchanged = PathManager::from_base(PathBuf::from("/tmp/wl")).with_data_dir(None);
        assert_eq!(unchanged.data_dir(), Path::new("/tmp/wl/data"));
    }
}
