use serde::{Deserialize, Serialize};
use std::fmt;
use crate::media::MediaItem;
use crate::watch_record::WatchRecord;

/// The three independently-deduplicated local collections
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Collections {
    pub watch_history: Vec<WatchRecord>,
    pub favorites: Vec<MediaItem>,
    pub watchlist: Vec<MediaItem>,
}

impl Collections {
    pub fn total_items(&self) -> usize {
        self.watch_history.len() + self.favorites.len() + self.watchlist.len()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Collection {
    WatchHistory,
    Favorites,
    Watchlist,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::WatchHistory, Collection::Favorites, Collection::Watchlist];

    /// Key used for this collection inside a backup file's `data` object
    pub fn backup_key(&self) -> &'static str {
        match self {
            Collection::WatchHistory => "watchHistory",
            Collection::Favorites => "favorites",
            Collection::Watchlist => "watchlist",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backup_key())
    }
}
