pub mod backup;
pub mod collections;
pub mod media;
pub mod nullable;
pub mod timestamp;
pub mod watch_record;

pub use backup::{BackupData, BackupDataset, BackupMetadata, ItemCounts, BACKUP_FORMAT_VERSION};
pub use collections::{Collection, Collections};
pub use media::{MediaItem, MediaType};
pub use timestamp::parse_timestamp;
pub use watch_record::{EpisodeProgress, WatchRecord};
