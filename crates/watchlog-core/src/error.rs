use std::path::PathBuf;
use thiserror::Error;
use watchlog_models::Collection;

/// Failure of a single backup item during restore; the item is skipped and counted
#[derive(Debug, Error)]
pub enum ItemError {
    #[error("item is not a valid record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("item {key} has an unparseable created_at {value:?}")]
    InvalidTimestamp { key: String, value: String },
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup file {path:?} must have a .json extension")]
    UnsupportedExtension { path: PathBuf },
    #[error("backup file is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("backup io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("backup json parse error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {collection}: {source}")]
    Serialize {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} is not a favorites-style list")]
    NotAList(Collection),
}
