// Persistence collaborators for the pure merge functions

use chrono::Utc;
use fd_lock::RwLockWriteGuard;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;
use watchlog_models::{Collection, Collections, MediaItem, MediaType, WatchRecord};
use crate::error::StoreError;
use crate::identity::find_index;

/// Storage seam for watch history, favorites and watchlist.
///
/// Every write is keyed by identity, so persisting the same record twice is a no-op.
pub trait HistoryStore {
    fn fetch_all(&self) -> Result<Collections, StoreError>;

    /// Upsert a history record by identity; returns the stored record with its id
    fn persist_record(&self, record: &WatchRecord) -> Result<WatchRecord, StoreError>;

    /// Upsert a favorites or watchlist item by identity
    fn persist_item(&self, list: Collection, item: &MediaItem) -> Result<MediaItem, StoreError>;

    fn delete_by_ids(&self, collection: Collection, ids: &[String]) -> Result<usize, StoreError>;

    fn delete_media(&self, collection: Collection, media_type: MediaType, media_id: u64) -> Result<usize, StoreError>;

    /// Overwrite all three collections, e.g. after a restore
    fn replace_all(&self, collections: &Collections) -> Result<(), StoreError>;

    fn clear(&self, collection: Collection) -> Result<usize, StoreError>;
}

/// One pretty-printed JSON file per collection inside a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, collection: Collection) -> PathBuf {
        let name = match collection {
            Collection::WatchHistory => "history.json",
            Collection::Favorites => "favorites.json",
            Collection::Watchlist => "watchlist.json",
        };
        self.dir.join(name)
    }

    fn load<T>(&self, collection: Collection) -> Result<Vec<T>, StoreError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let path = self.path_for(collection);
        if !path.exists() {
            debug!("Store miss: {} (file does not exist)", collection);
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        match serde_json::from_str::<Vec<T>>(&content) {
            Ok(data) => {
                debug!("Store loaded: {} ({} items)", collection, data.len());
                Ok(data)
            }
            Err(e) => {
                // Set the file aside rather than deleting it; it is user data
                let aside = set_aside_path(&path);
                warn!(
                    "Corrupt store file for {}: {}. Moving it to {:?} and starting empty.",
                    collection, e, aside
                );
                if let Err(rename_err) = std::fs::rename(&path, &aside) {
                    warn!("Failed to move corrupt store file: {}", rename_err);
                }
                Ok(Vec::new())
            }
        }
    }

    fn save<T>(&self, collection: Collection, data: &[T]) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let path = self.path_for(collection);
        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(data).map_err(|source| StoreError::Serialize {
            collection: collection.to_string(),
            source,
        })?;

        // Write then rename so a crash never leaves a half-written collection
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("Store saved: {} ({} items)", collection, data.len());
        Ok(())
    }

    fn load_items(&self, list: Collection) -> Result<Vec<MediaItem>, StoreError> {
        match list {
            Collection::WatchHistory => Err(StoreError::NotAList(list)),
            _ => self.load(list),
        }
    }
}

impl HistoryStore for JsonFileStore {
    fn fetch_all(&self) -> Result<Collections, StoreError> {
        Ok(Collections {
            watch_history: self.load(Collection::WatchHistory)?,
            favorites: self.load(Collection::Favorites)?,
            watchlist: self.load(Collection::Watchlist)?,
        })
    }

    fn persist_record(&self, record: &WatchRecord) -> Result<WatchRecord, StoreError> {
        let mut history: Vec<WatchRecord> = self.load(Collection::WatchHistory)?;
        let mut stored = record.clone();

        if let Some(idx) = find_index(history.as_slice(), record) {
            let existing = history.remove(idx);
            if stored.id.is_empty() {
                stored.id = existing.id;
            }
        }
        if stored.id.is_empty() {
            stored.id = new_id();
        }

        history.insert(0, stored.clone());
        self.save(Collection::WatchHistory, &history)?;
        Ok(stored)
    }

    fn persist_item(&self, list: Collection, item: &MediaItem) -> Result<MediaItem, StoreError> {
        let mut items = self.load_items(list)?;
        let mut stored = item.clone();

        if let Some(idx) = find_index(items.as_slice(), item) {
            let existing = items.remove(idx);
            if stored.id.is_empty() {
                stored.id = existing.id;
            }
        }
        if stored.id.is_empty() {
            stored.id = new_id();
        }

        items.insert(0, stored.clone());
        self.save(list, &items)?;
        Ok(stored)
    }

    fn delete_by_ids(&self, collection: Collection, ids: &[String]) -> Result<usize, StoreError> {
        match collection {
            Collection::WatchHistory => {
                let mut history: Vec<WatchRecord> = self.load(collection)?;
                let before = history.len();
                history.retain(|r| !ids.contains(&r.id));
                let removed = before - history.len();
                self.save(collection, &history)?;
                Ok(removed)
            }
            list => {
                let mut items = self.load_items(list)?;
                let before = items.len();
                items.retain(|i| !ids.contains(&i.id));
                let removed = before - items.len();
                self.save(list, &items)?;
                Ok(removed)
            }
        }
    }

    fn delete_media(&self, collection: Collection, media_type: MediaType, media_id: u64) -> Result<usize, StoreError> {
        let removed = match collection {
            Collection::WatchHistory => {
                let mut history: Vec<WatchRecord> = self.load(collection)?;
                let before = history.len();
                history.retain(|r| !(r.media_type == media_type && r.media_id == media_id));
                let removed = before - history.len();
                self.save(collection, &history)?;
                removed
            }
            list => {
                let mut items = self.load_items(list)?;
                let before = items.len();
                items.retain(|i| !(i.media_type == media_type && i.media_id == media_id));
                let removed = before - items.len();
                self.save(list, &items)?;
                removed
            }
        };
        info!("Removed {} {}:{} from {}", removed, media_type, media_id, collection);
        Ok(removed)
    }

    fn replace_all(&self, collections: &Collections) -> Result<(), StoreError> {
        let mut collections = collections.clone();
        for record in &mut collections.watch_history {
            if record.id.is_empty() {
                record.id = new_id();
            }
        }
        for item in collections.favorites.iter_mut().chain(collections.watchlist.iter_mut()) {
            if item.id.is_empty() {
                item.id = new_id();
            }
        }

        self.save(Collection::WatchHistory, &collections.watch_history)?;
        self.save(Collection::Favorites, &collections.favorites)?;
        self.save(Collection::Watchlist, &collections.watchlist)?;
        info!(
            "Store replaced: history={}, favorites={}, watchlist={}",
            collections.watch_history.len(),
            collections.favorites.len(),
            collections.watchlist.len()
        );
        Ok(())
    }

    fn clear(&self, collection: Collection) -> Result<usize, StoreError> {
        let removed = match collection {
            Collection::WatchHistory => self.load::<WatchRecord>(collection)?.len(),
            list => self.load::<MediaItem>(list)?.len(),
        };
        let path = self.path_for(collection);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|source| StoreError::Io { path, source })?;
        }
        info!("Cleared {} ({} items)", collection, removed);
        Ok(removed)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// `<name>.corrupt-<utc timestamp>`, never reusing an existing name
fn set_aside_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = format!("{}.corrupt-{}", name, Utc::now().format("%Y%m%dT%H%M%S%.3fZ"));

    let mut candidate = path.with_file_name(&base);
    let mut n = 1;
    while candidate.exists() {
        candidate = path.with_file_name(format!("{}-{}", base, n));
        n += 1;
    }
    candidate
}

const LOCK_FILE: &str = ".watchlog.lock";

/// Advisory lock over a store directory, shared by every process that writes it.
///
/// Hold the guard for the whole read-modify-write cycle.
pub struct StoreLock {
    path: PathBuf,
    lock: fd_lock::RwLock<File>,
}

impl StoreLock {
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            lock: fd_lock::RwLock::new(file),
        })
    }

    /// Block until the lock is free
    pub fn write(&mut self) -> Result<RwLockWriteGuard<'_, File>, StoreError> {
        let path = self.path.clone();
        debug!("Waiting for store lock {:?}", path);
        self.lock.write().map_err(|source| StoreError::Io { path, source })
    }

    /// `None` when another writer holds the lock
    pub fn try_write(&mut self) -> Result<Option<RwLockWriteGuard<'_, File>>, StoreError> {
        let path = self.path.clone();
        match self.lock.try_write() {
            Ok(guard) => Ok(Some(guard)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                debug!("Store lock {:?} is held elsewhere", path);
                Ok(None)
            }
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}
