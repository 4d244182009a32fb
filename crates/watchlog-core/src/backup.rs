// Backup files: export and the read boundary in front of validate/restore

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};
use watchlog_models::{BackupData, BackupDataset, BackupMetadata, Collections, ItemCounts, BACKUP_FORMAT_VERSION};
use crate::error::BackupError;

/// Upper bound on backup size checked before the file is read
pub const DEFAULT_MAX_BACKUP_BYTES: u64 = 50 * 1024 * 1024;

/// Snapshot local collections into an exportable dataset
pub fn create_backup(collections: &Collections, now: DateTime<Utc>) -> BackupDataset {
    BackupDataset {
        metadata: BackupMetadata {
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            version: Some(BACKUP_FORMAT_VERSION.to_string()),
            item_counts: Some(ItemCounts {
                watch_history: collections.watch_history.len(),
                favorites: collections.favorites.len(),
                watchlist: collections.watchlist.len(),
            }),
        },
        data: BackupData {
            watch_history: collections.watch_history.clone(),
            favorites: collections.favorites.clone(),
            watchlist: collections.watchlist.clone(),
        },
    }
}

pub fn write_backup_file(path: &Path, dataset: &BackupDataset) -> Result<(), BackupError> {
    check_extension(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| BackupError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_string_pretty(dataset).map_err(|source| BackupError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| BackupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Backup written: {:?}", path);
    Ok(())
}

/// Read a backup file into an untyped value for validation.
///
/// Extension and size are checked before any content is read; the file is
/// closed again before this returns.
pub fn read_backup_file(path: &Path, max_bytes: u64) -> Result<Value, BackupError> {
    check_extension(path)?;

    let size = std::fs::metadata(path)
        .map_err(|source| BackupError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    if size > max_bytes {
        return Err(BackupError::TooLarge { size, limit: max_bytes });
    }

    let content = std::fs::read_to_string(path).map_err(|source| BackupError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_str(&content).map_err(|source| BackupError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Backup read: {:?} ({} bytes)", path, size);
    Ok(value)
}

fn check_extension(path: &Path) -> Result<(), BackupError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(())
    } else {
        Err(BackupError::UnsupportedExtension {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::restore;
    use crate::validate::validate;
    use chrono::TimeZone;
    use tempfile::TempDir;
    use watchlog_models::{MediaItem, MediaType, WatchRecord};

    fn sample() -> Collections {
        Collections {
            watch_history: vec![
                WatchRecord::episode(1399, "Show", 1, 2, "2024-01-02T00:00:00Z"),
                WatchRecord::movie(550, "Fight Club", "2024-01-01T00:00:00Z"),
            ],
            favorites: vec![MediaItem::new(MediaType::Movie, 550, "Fight Club", "2024-01-01T00:00:00Z")],
            watchlist: Vec::new(),
        }
    }

    #[test]
    fn test_create_backup_metadata() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let backup = create_backup(&sample(), now);
        assert_eq!(backup.metadata.created_at, "2024-05-01T08:30:00.000Z");
        assert_eq!(backup.metadata.version.as_deref(), Some(BACKUP_FORMAT_VERSION));
        assert_eq!(backup.metadata.item_counts.unwrap().watch_history, 2);
    }

    #[test]
    fn test_exported_backup_validates_and_restores_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.json");
        write_backup_file(&path, &create_backup(&sample(), Utc::now())).unwrap();

        let value = read_backup_file(&path, DEFAULT_MAX_BACKUP_BYTES).unwrap();
        let report = validate(&value);
        assert!(report.is_valid);
        assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);

        let result = restore(&value, &Collections::default());
        assert_eq!(result.stats.total_added(), 3);
        assert_eq!(result.stats.total_errors(), 0);
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.txt");
        std::fs::write(&path, "{}").unwrap();
        assert!(matches!(
            read_backup_file(&path, DEFAULT_MAX_BACKUP_BYTES),
            Err(BackupError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.JSON");
        std::fs::write(&path, "[1,2,3,4,5,6,7,8,9]").unwrap();
        assert!(matches!(read_backup_file(&path, 4), Err(BackupError::TooLarge { limit: 4, .. })));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"data\": ").unwrap();
        assert!(matches!(read_backup_file(&path, DEFAULT_MAX_BACKUP_BYTES), Err(BackupError::Json { .. })));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");
        assert!(matches!(read_backup_file(&path, DEFAULT_MAX_BACKUP_BYTES), Err(BackupError::Io { .. })));
    }
}
