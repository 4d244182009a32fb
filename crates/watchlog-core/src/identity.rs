use std::fmt;
use watchlog_models::{EpisodeProgress, MediaItem, MediaType, WatchRecord};

/// Separator between media type and id; never produced by either field
pub const KEY_SEPARATOR: char = ':';

/// Build the identity key for a title. Season and episode are never part of it:
/// a show has exactly one canonical row.
pub fn identity_key(media_type: MediaType, media_id: u64) -> String {
    format!("{}{}{}", media_type.as_str(), KEY_SEPARATOR, media_id)
}

/// Anything that refers to a catalog title
pub trait Identifiable {
    fn media_type(&self) -> MediaType;
    fn media_id(&self) -> u64;

    fn identity_key(&self) -> String {
        identity_key(self.media_type(), self.media_id())
    }

    fn same_media<T: Identifiable + ?Sized>(&self, other: &T) -> bool
    where
        Self: Sized,
    {
        self.media_type() == other.media_type() && self.media_id() == other.media_id()
    }
}

impl Identifiable for WatchRecord {
    fn media_type(&self) -> MediaType {
        self.media_type
    }

    fn media_id(&self) -> u64 {
        self.media_id
    }
}

impl Identifiable for MediaItem {
    fn media_type(&self) -> MediaType {
        self.media_type
    }

    fn media_id(&self) -> u64 {
        self.media_id
    }
}

/// Position of the entry sharing `target`'s identity, if any
pub fn find_index<T, U>(collection: &[T], target: &U) -> Option<usize>
where
    T: Identifiable,
    U: Identifiable + ?Sized,
{
    collection.iter().position(|item| item.same_media(target))
}

/// Identity of an episode inside a show's `episodes_watched` list.
/// Only meaningful within one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpisodeKey {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeKey {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }

    /// Key of a record's head episode. Missing numbers become 0.
    pub fn of_head(record: &WatchRecord) -> Self {
        Self::new(record.season.unwrap_or(0), record.episode.unwrap_or(0))
    }

    pub fn of_entry(entry: &EpisodeProgress) -> Self {
        Self::new(entry.season, entry.episode)
    }

    pub fn matches(&self, entry: &EpisodeProgress) -> bool {
        entry.season == self.season && entry.episode == self.episode
    }
}

impl fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}
