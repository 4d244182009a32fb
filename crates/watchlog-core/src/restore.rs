// Bulk merge of a backup dataset into local collections

use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use watchlog_models::{Collection, Collections, MediaItem, WatchRecord};
use crate::error::ItemError;
use crate::identity::{find_index, Identifiable};
use crate::merge::{is_newer, merge_into, normalize_new_record};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub added: usize,
    pub updated: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreStats {
    pub watch_history: CategoryStats,
    pub favorites: CategoryStats,
    pub watchlist: CategoryStats,
}

impl RestoreStats {
    pub fn get(&self, collection: Collection) -> &CategoryStats {
        match collection {
            Collection::WatchHistory => &self.watch_history,
            Collection::Favorites => &self.favorites,
            Collection::Watchlist => &self.watchlist,
        }
    }

    pub fn total_added(&self) -> usize {
        self.watch_history.added + self.favorites.added + self.watchlist.added
    }

    pub fn total_updated(&self) -> usize {
        self.watch_history.updated + self.favorites.updated + self.watchlist.updated
    }

    pub fn total_errors(&self) -> usize {
        self.watch_history.errors + self.favorites.errors + self.watchlist.errors
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreResult {
    /// `true` when the restore ran to completion; item failures are counted, not fatal
    pub success: bool,
    pub message: String,
    pub stats: RestoreStats,
    /// Updated collections; equal to the input when `success` is `false`
    pub collections: Collections,
}

impl RestoreResult {
    fn failed(message: String, collections: &Collections) -> Self {
        warn!("restore: aborted: {}", message);
        Self {
            success: false,
            message,
            stats: RestoreStats::default(),
            collections: collections.clone(),
        }
    }
}

/// Parse backup text and restore it. Unparseable text aborts with `success = false`.
pub fn restore_from_str(text: &str, collections: &Collections) -> RestoreResult {
    match serde_json::from_str::<Value>(text) {
        Ok(dataset) => restore(&dataset, collections),
        Err(e) => RestoreResult::failed(format!("Backup is not valid JSON: {}", e), collections),
    }
}

/// Merge every category of `dataset` into a copy of `collections`.
///
/// Each item is parsed before anything is touched, so a failing item leaves no
/// partial state behind: it is counted under `errors` and skipped. History
/// items go through the incremental merge rules; favorites and watchlist use
/// replace-if-newer.
pub fn restore(dataset: &Value, collections: &Collections) -> RestoreResult {
    let Some(data) = dataset.get("data").and_then(Value::as_object) else {
        return RestoreResult::failed("Backup is missing the \"data\" object".to_string(), collections);
    };

    // Shape is checked for every category before anything is merged
    let (history_items, favorite_items, watchlist_items) = match (
        category_items(data, Collection::WatchHistory),
        category_items(data, Collection::Favorites),
        category_items(data, Collection::Watchlist),
    ) {
        (Ok(history), Ok(favorites), Ok(watchlist)) => (history, favorites, watchlist),
        (Err(message), _, _) | (_, Err(message), _) | (_, _, Err(message)) => {
            return RestoreResult::failed(message, collections);
        }
    };

    let mut restored = collections.clone();
    let mut stats = RestoreStats::default();

    stats.watch_history = restore_history(history_items, &mut restored.watch_history);
    stats.favorites = restore_items(Collection::Favorites, favorite_items, &mut restored.favorites);
    stats.watchlist = restore_items(Collection::Watchlist, watchlist_items, &mut restored.watchlist);

    // Keep most-recent-first after a bulk merge; stable for equal timestamps
    restored
        .watch_history
        .sort_by_key(|record| Reverse(record.created_time()));

    for collection in Collection::ALL {
        let s = stats.get(collection);
        info!(
            "restore: {}: added={}, updated={}, errors={}",
            collection, s.added, s.updated, s.errors
        );
    }

    let message = format!(
        "Restored {} new and {} updated items ({} skipped)",
        stats.total_added(),
        stats.total_updated(),
        stats.total_errors()
    );
    RestoreResult {
        success: true,
        message,
        stats,
        collections: restored,
    }
}

/// Items of one category. A missing `watchHistory` or any non-array category
/// is a shape error; missing `favorites`/`watchlist` are empty.
fn category_items(data: &Map<String, Value>, collection: Collection) -> Result<&[Value], String> {
    match data.get(collection.backup_key()) {
        Some(Value::Array(items)) => Ok(items.as_slice()),
        None | Some(Value::Null) if collection == Collection::WatchHistory => {
            Err(format!("Backup is missing data.{}", collection.backup_key()))
        }
        None | Some(Value::Null) => Ok(&[]),
        Some(_) => Err(format!("data.{} must be an array", collection.backup_key())),
    }
}

fn restore_history(items: &[Value], history: &mut Vec<WatchRecord>) -> CategoryStats {
    let mut stats = CategoryStats::default();
    for (index, item) in items.iter().enumerate() {
        let record = match parse_history_item(item) {
            Ok(record) => record,
            Err(e) => {
                warn!("restore: skipping data.watchHistory[{}]: {}", index, e);
                stats.errors += 1;
                continue;
            }
        };

        if find_index(history.as_slice(), &record).is_some() {
            merge_into(history, &record);
            stats.updated += 1;
        } else {
            history.insert(0, normalize_new_record(&record));
            stats.added += 1;
        }
    }
    stats
}

fn restore_items(collection: Collection, items: &[Value], target: &mut Vec<MediaItem>) -> CategoryStats {
    let mut stats = CategoryStats::default();
    for (index, item) in items.iter().enumerate() {
        let incoming = match parse_list_item(item) {
            Ok(incoming) => incoming,
            Err(e) => {
                warn!("restore: skipping data.{}[{}]: {}", collection, index, e);
                stats.errors += 1;
                continue;
            }
        };

        match find_index(target.as_slice(), &incoming) {
            Some(idx) => {
                if is_newer(&incoming.created_at, &target[idx].created_at) {
                    let mut replacement = incoming;
                    if replacement.id.is_empty() {
                        replacement.id = target[idx].id.clone();
                    }
                    target[idx] = replacement;
                } else {
                    debug!("restore: keeping local {} {}", collection, target[idx].identity_key());
                }
                stats.updated += 1;
            }
            None => {
                target.insert(0, incoming);
                stats.added += 1;
            }
        }
    }
    stats
}

/// Typed parse of one history item; the validator shares it so that its
/// usable counts match what a restore accepts
pub(crate) fn parse_history_item(item: &Value) -> Result<WatchRecord, ItemError> {
    let record: WatchRecord = serde_json::from_value(item.clone())?;
    if record.created_time().is_none() {
        return Err(ItemError::InvalidTimestamp {
            key: record.identity_key(),
            value: record.created_at,
        });
    }
    Ok(record)
}

pub(crate) fn parse_list_item(item: &Value) -> Result<MediaItem, ItemError> {
    Ok(serde_json::from_value(item.clone())?)
}

/// In-flight flag for bulk restores; one logical writer at a time.
#[derive(Debug, Default)]
pub struct RestoreGate {
    in_flight: AtomicBool,
}

impl RestoreGate {
    pub const fn new() -> Self {
        Self {
            in_flight: AtomicBool::new(false),
        }
    }

    /// Claim the gate, or `None` if a restore is already running
    pub fn try_begin(&self) -> Option<RestorePermit<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RestorePermit { gate: self })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Releases its [`RestoreGate`] on drop
#[derive(Debug)]
pub struct RestorePermit<'a> {
    gate: &'a RestoreGate,
}

impl Drop for RestorePermit<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use watchlog_models::MediaType;

    fn favorite(id: u64, created_at: &str) -> Value {
        json!({ "media_id": id, "media_type": "movie", "title": format!("Movie {}", id), "created_at": created_at })
    }

    fn history_movie(id: u64, created_at: &str) -> Value {
        json!({ "media_id": id, "media_type": "movie", "title": "Movie", "created_at": created_at, "watch_position": 10, "duration": 100 })
    }

    #[test]
    fn test_restore_counts_null_media_id_as_error() {
        let dataset = json!({
            "data": {
                "watchHistory": [],
                "favorites": [favorite(1, "2024-01-01T00:00:00Z"), { "media_id": null, "media_type": "movie" }, favorite(2, "2024-01-01T00:00:00Z")],
                "watchlist": []
            }
        });
        let result = restore(&dataset, &Collections::default());
        assert!(result.success);
        assert_eq!(result.stats.favorites, CategoryStats { added: 2, updated: 0, errors: 1 });
        assert_eq!(result.collections.favorites.len(), 2);
    }

    #[test]
    fn test_one_bad_item_in_hundred() {
        let mut items: Vec<Value> = (1..=100).map(|id| history_movie(id, "2024-01-01T00:00:00Z")).collect();
        items[41] = json!({ "media_id": 42, "media_type": "podcast", "created_at": "2024-01-01T00:00:00Z" });
        let dataset = json!({ "data": { "watchHistory": items, "favorites": [], "watchlist": [] } });

        let result = restore(&dataset, &Collections::default());
        assert!(result.success);
        assert_eq!(result.collections.watch_history.len(), 99);
        assert_eq!(result.stats.watch_history.errors, 1);
        assert_eq!(result.stats.watch_history.added, 99);
        assert!(result.collections.watch_history.iter().all(|r| r.media_id != 42));
    }

    #[test]
    fn test_history_match_uses_merge_rules() {
        let mut local = Collections::default();
        local.watch_history.push(WatchRecord::episode(1399, "Show", 1, 1, "2024-01-01T00:00:00Z").with_progress(10.0, 100.0));
        local.watch_history.push(WatchRecord::movie(550, "Fight Club", "2024-03-01T00:00:00Z").with_progress(80.0, 100.0));

        let dataset = json!({
            "data": {
                "watchHistory": [
                    { "media_id": 1399, "media_type": "tv", "season": 1, "episode": 2, "created_at": "2024-01-02T00:00:00Z", "watch_position": 5, "duration": 100 },
                    history_movie(550, "2024-02-01T00:00:00Z")
                ],
                "favorites": [],
                "watchlist": []
            }
        });
        let result = restore(&dataset, &local);
        assert_eq!(result.stats.watch_history, CategoryStats { added: 0, updated: 2, errors: 0 });

        let history = &result.collections.watch_history;
        let show = history.iter().find(|r| r.media_type == MediaType::Tv).unwrap();
        assert_eq!(show.episodes_watched.as_ref().unwrap().len(), 2);
        assert_eq!(show.episode, Some(2));
        // Stale backup copy of the movie does not overwrite local progress
        let movie = history.iter().find(|r| r.media_id == 550).unwrap();
        assert_eq!(movie.watch_position, 80.0);
        // Most recent first
        assert_eq!(history[0].media_id, 550);
    }

    #[test]
    fn test_added_show_keeps_its_episode_list() {
        let dataset = json!({
            "data": {
                "watchHistory": [{
                    "media_id": 1399, "media_type": "tv", "season": 1, "episode": 2,
                    "created_at": "2024-01-02T00:00:00Z",
                    "episodes_watched": [
                        { "season": 1, "episode": 1, "watch_position": 100, "duration": 100, "watched_at": "2024-01-01T00:00:00Z" },
                        { "season": 1, "episode": 2, "watch_position": 40, "duration": 100, "watched_at": "2024-01-02T00:00:00Z" }
                    ]
                }],
                "favorites": [],
                "watchlist": []
            }
        });
        let result = restore(&dataset, &Collections::default());
        let show = &result.collections.watch_history[0];
        assert_eq!(show.episodes_watched.as_ref().unwrap().len(), 2);
        assert_eq!(show.last_watched_at.as_deref(), Some("2024-01-02T00:00:00Z"));
    }

    #[test]
    fn test_favorites_replace_if_newer() {
        let mut local = Collections::default();
        let mut existing = MediaItem::new(MediaType::Movie, 1, "Old title", "2024-01-01T00:00:00Z");
        existing.id = "fav-1".to_string();
        local.favorites.push(existing);
        local.watchlist.push(MediaItem::new(MediaType::Movie, 2, "Keep me", "2024-06-01T00:00:00Z"));

        let dataset = json!({
            "data": {
                "watchHistory": [],
                "favorites": [{ "media_id": 1, "media_type": "movie", "title": "New title", "created_at": "2024-02-01T00:00:00Z" }],
                "watchlist": [{ "media_id": 2, "media_type": "movie", "title": "Older", "created_at": "2024-01-01T00:00:00Z" }]
            }
        });
        let result = restore(&dataset, &local);
        assert_eq!(result.stats.favorites.updated, 1);
        assert_eq!(result.collections.favorites[0].title, "New title");
        assert_eq!(result.collections.favorites[0].id, "fav-1");
        assert_eq!(result.stats.watchlist.updated, 1);
        assert_eq!(result.collections.watchlist[0].title, "Keep me");
    }

    #[test]
    fn test_invalid_created_at_is_an_item_error() {
        let dataset = json!({ "data": { "watchHistory": [history_movie(1, "garbage"), history_movie(2, "2024-01-01T00:00:00Z")] } });
        let result = restore(&dataset, &Collections::default());
        assert_eq!(result.stats.watch_history, CategoryStats { added: 1, updated: 0, errors: 1 });
    }

    #[test]
    fn test_top_level_failure_leaves_collections_untouched() {
        let mut local = Collections::default();
        local.favorites.push(MediaItem::new(MediaType::Tv, 9, "Show", "2024-01-01T00:00:00Z"));

        let result = restore_from_str("{ not json", &local);
        assert!(!result.success);
        assert_eq!(result.stats, RestoreStats::default());
        assert_eq!(result.collections, local);
        assert!(result.message.contains("not valid JSON"));

        let result = restore(&json!({ "metadata": {} }), &local);
        assert!(!result.success);
        assert_eq!(result.collections, local);
    }

    #[test]
    fn test_malformed_category_aborts_without_merging() {
        let mut local = Collections::default();
        local.watchlist.push(MediaItem::new(MediaType::Movie, 7, "Local", "2024-01-01T00:00:00Z"));

        let shapes = [
            json!({ "data": { "watchHistory": { "oops": 1 }, "favorites": [favorite(1, "2024-01-01T00:00:00Z")], "watchlist": [] } }),
            json!({ "data": { "favorites": [favorite(1, "2024-01-01T00:00:00Z")], "watchlist": [] } }),
            json!({ "data": { "watchHistory": [history_movie(2, "2024-01-01T00:00:00Z")], "favorites": "nope" } }),
            json!({ "data": { "watchHistory": [], "favorites": [], "watchlist": 3 } }),
        ];
        for dataset in &shapes {
            let result = restore(dataset, &local);
            assert!(!result.success, "restored {}", dataset);
            assert_eq!(result.stats, RestoreStats::default());
            assert_eq!(result.collections, local);
        }

        let result = restore(&shapes[0], &local);
        assert!(result.message.contains("data.watchHistory must be an array"));
    }

    #[test]
    fn test_null_descriptive_fields_are_restored() {
        let dataset = json!({
            "data": {
                "watchHistory": [
                    { "id": null, "media_id": 1, "media_type": "movie", "title": "A", "created_at": "2024-01-01T00:00:00Z" },
                    { "media_id": 2, "media_type": "movie", "title": null, "created_at": "2024-01-01T00:00:00Z" },
                    { "media_id": 3, "media_type": "movie", "watch_position": null, "duration": null, "created_at": "2024-01-01T00:00:00Z" }
                ],
                "favorites": [{ "media_id": 4, "media_type": "tv", "title": null, "created_at": "2024-01-01T00:00:00Z" }],
                "watchlist": []
            }
        });
        let result = restore(&dataset, &Collections::default());
        assert!(result.success);
        assert_eq!(result.stats.watch_history, CategoryStats { added: 3, updated: 0, errors: 0 });
        assert_eq!(result.stats.favorites, CategoryStats { added: 1, updated: 0, errors: 0 });
        assert_eq!(result.collections.watch_history.len(), 3);
    }

    #[test]
    fn test_missing_categories_are_empty() {
        let result = restore(&json!({ "data": { "watchHistory": [history_movie(1, "2024-01-01T00:00:00Z")] } }), &Collections::default());
        assert!(result.success);
        assert_eq!(result.stats.total_added(), 1);
        assert_eq!(result.stats.favorites, CategoryStats::default());
    }

    #[test]
    fn test_restore_gate_is_exclusive() {
        let gate = RestoreGate::new();
        let permit = gate.try_begin();
        assert!(permit.is_some());
        assert!(gate.is_in_flight());
        assert!(gate.try_begin().is_none());
        drop(permit);
        assert!(!gate.is_in_flight());
        assert!(gate.try_begin().is_some());
    }
}
