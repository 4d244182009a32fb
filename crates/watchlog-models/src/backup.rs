use serde::{Deserialize, Serialize};
use crate::media::MediaItem;
use crate::watch_record::WatchRecord;

/// Version marker written into exported backups
pub const BACKUP_FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackupDataset {
    pub metadata: BackupMetadata,
    pub data: BackupData,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_counts: Option<ItemCounts>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemCounts {
    pub watch_history: usize,
    pub favorites: usize,
    pub watchlist: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub watch_history: Vec<WatchRecord>,
    #[serde(default)]
    pub favorites: Vec<MediaItem>,
    #[serde(default)]
    pub watchlist: Vec<MediaItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_uses_camel_case_keys() {
        let dataset = BackupDataset {
            metadata: BackupMetadata {
                created_at: "2024-01-01T00:00:00Z".to_string(),
                version: Some(BACKUP_FORMAT_VERSION.to_string()),
                item_counts: Some(ItemCounts::default()),
            },
            data: BackupData::default(),
        };
        let value = serde_json::to_value(&dataset).unwrap();
        assert!(value["metadata"]["createdAt"].is_string());
        assert!(value["metadata"]["itemCounts"]["watchHistory"].is_number());
        assert!(value["data"]["watchHistory"].is_array());
        assert!(value["data"]["favorites"].is_array());
    }
}
