pub mod backup;
pub mod dedup;
pub mod episode;
pub mod error;
pub mod identity;
pub mod merge;
pub mod restore;
pub mod store;
pub mod validate;

pub use backup::{create_backup, read_backup_file, write_backup_file, DEFAULT_MAX_BACKUP_BYTES};
pub use dedup::{deduplicate, deduplicate_with_report, DedupReport};
pub use episode::{apply_live_progress, find_episode, update_episode, update_episode_at};
pub use error::{BackupError, ItemError, StoreError};
pub use identity::{find_index, identity_key, EpisodeKey, Identifiable};
pub use merge::{apply_update, merge_into, tracked_episodes, UpdateOutcome};
pub use restore::{restore, restore_from_str, CategoryStats, RestoreGate, RestorePermit, RestoreResult, RestoreStats};
pub use store::{HistoryStore, JsonFileStore, StoreLock};
pub use validate::{validate, validate_with, ValidationOptions, ValidationReport};
