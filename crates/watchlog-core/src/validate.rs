// Structural validation of backup datasets before restore

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, trace};
use watchlog_models::{parse_timestamp, Collection, ItemCounts, BACKUP_FORMAT_VERSION};
use crate::error::ItemError;
use crate::restore::{parse_history_item, parse_list_item};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// `false` iff `errors` is non-empty
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Items per category that passed the structural checks
    pub usable: ItemCounts,
}

#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Treat a missing `favorites`/`watchlist` array as empty (with a warning)
    /// instead of rejecting the dataset
    pub allow_missing_collections: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            allow_missing_collections: true,
        }
    }
}

/// Validate a backup with default options
pub fn validate(dataset: &Value) -> ValidationReport {
    validate_with(dataset, &ValidationOptions::default())
}

/// Check a backup for structural validity. Never mutates the input.
///
/// Items that cannot be restored are counted per category and reported as a
/// single warning; the dataset is only invalid when the top-level shape is
/// wrong or when it had items and none of them are usable.
pub fn validate_with(dataset: &Value, options: &ValidationOptions) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut usable = ItemCounts::default();

    let Some(root) = dataset.as_object() else {
        errors.push(format!("Backup must be a JSON object, found {}", json_kind(dataset)));
        return finish(errors, warnings, usable);
    };

    let Some(data) = root.get("data").and_then(Value::as_object) else {
        errors.push("Backup is missing the \"data\" object".to_string());
        return finish(errors, warnings, usable);
    };

    let mut actual = ItemCounts::default();
    let mut total_items = 0;
    let mut total_usable = 0;

    for collection in Collection::ALL {
        let key = collection.backup_key();
        match data.get(key) {
            None | Some(Value::Null) => {
                if collection == Collection::WatchHistory || !options.allow_missing_collections {
                    errors.push(format!("Missing data.{}", key));
                } else {
                    warnings.push(format!("data.{} is missing; it will be treated as empty", key));
                }
            }
            Some(Value::Array(items)) => {
                let summary = check_items(collection, items);
                total_items += items.len();
                total_usable += summary.usable;
                set_count(&mut actual, collection, items.len());
                set_count(&mut usable, collection, summary.usable);

                let skipped = items.len() - summary.usable;
                if skipped > 0 {
                    warnings.push(format!(
                        "{} of {} data.{} items could not be read as records (bad media_id, media_type, created_at or field types) and will be skipped",
                        skipped,
                        items.len(),
                        key
                    ));
                }
                if summary.missing_episode > 0 {
                    warnings.push(format!(
                        "{} tv items in data.{} have no season/episode; they will be recorded as episode 0",
                        summary.missing_episode, key
                    ));
                }
            }
            Some(other) => {
                errors.push(format!("data.{} must be an array, found {}", key, json_kind(other)));
            }
        }
    }

    if errors.is_empty() && total_items > 0 && total_usable == 0 {
        errors.push("No valid items found in backup".to_string());
    }

    check_metadata(root.get("metadata"), &actual, data, &mut warnings);

    debug!(
        "validate: items={}, usable={}, errors={}, warnings={}",
        total_items,
        total_usable,
        errors.len(),
        warnings.len()
    );
    finish(errors, warnings, usable)
}

fn finish(errors: Vec<String>, warnings: Vec<String>, usable: ItemCounts) -> ValidationReport {
    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        usable,
    }
}

struct ItemSummary {
    usable: usize,
    missing_episode: usize,
}

fn check_items(collection: Collection, items: &[Value]) -> ItemSummary {
    let mut summary = ItemSummary { usable: 0, missing_episode: 0 };
    for (index, item) in items.iter().enumerate() {
        match check_item(collection, item) {
            Ok(missing_episode) => {
                summary.usable += 1;
                if missing_episode {
                    summary.missing_episode += 1;
                }
            }
            Err(reason) => {
                trace!("validate: data.{}[{}] skipped: {}", collection.backup_key(), index, reason);
            }
        }
    }
    summary
}

/// `Ok(true)` for a usable tv history item that lacks season/episode.
///
/// Uses the same typed parse as restore, so "usable" here means restorable.
fn check_item(collection: Collection, item: &Value) -> Result<bool, ItemError> {
    match collection {
        Collection::WatchHistory => {
            let record = parse_history_item(item)?;
            Ok(record.is_tv() && (record.season.is_none() || record.episode.is_none()))
        }
        Collection::Favorites | Collection::Watchlist => parse_list_item(item).map(|_| false),
    }
}

fn check_metadata(metadata: Option<&Value>, actual: &ItemCounts, data: &Map<String, Value>, warnings: &mut Vec<String>) {
    let Some(metadata) = metadata.and_then(Value::as_object) else {
        warnings.push("Backup has no metadata; creation time and version are unknown".to_string());
        return;
    };

    match metadata.get("createdAt").and_then(Value::as_str) {
        None => warnings.push("metadata.createdAt is missing".to_string()),
        Some(created) if parse_timestamp(created).is_none() => {
            warnings.push(format!("metadata.createdAt {:?} is not a valid timestamp", created));
        }
        Some(_) => {}
    }

    match metadata.get("version").and_then(Value::as_str) {
        None => warnings.push(format!("Backup has no version marker; assuming {}", BACKUP_FORMAT_VERSION)),
        Some(version) if version != BACKUP_FORMAT_VERSION => {
            warnings.push(format!("Unknown backup version {}; attempting import anyway", version));
        }
        Some(_) => {}
    }

    let Some(declared) = metadata.get("itemCounts").and_then(Value::as_object) else {
        return;
    };
    for collection in Collection::ALL {
        let key = collection.backup_key();
        // Counts are only comparable for arrays that are actually present
        if !data.get(key).is_some_and(Value::is_array) {
            continue;
        }
        let Some(expected) = declared.get(key).and_then(Value::as_u64) else {
            continue;
        };
        let found = count_of(actual, collection);
        if expected != found as u64 {
            warnings.push(format!(
                "metadata declares {} {} items but the backup contains {}",
                expected, key, found
            ));
        }
    }
}

fn count_of(counts: &ItemCounts, collection: Collection) -> usize {
    match collection {
        Collection::WatchHistory => counts.watch_history,
        Collection::Favorites => counts.favorites,
        Collection::Watchlist => counts.watchlist,
    }
}

fn set_count(counts: &mut ItemCounts, collection: Collection, value: usize) {
    match collection {
        Collection::WatchHistory => counts.watch_history = value,
        Collection::Favorites => counts.favorites = value,
        Collection::Watchlist => counts.watchlist = value,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::restore::restore;
    use serde_json::json;
    use watchlog_models::Collections;

    fn metadata() -> Value {
        json!({ "createdAt": "2024-05-01T10:00:00Z", "version": "1.0" })
    }

    fn history_item(id: u64) -> Value {
        json!({ "media_id": id, "media_type": "movie", "title": "Movie", "created_at": "2024-01-01T00:00:00Z" })
    }

    #[test]
    fn test_missing_watch_history_is_invalid() {
        let dataset = json!({ "metadata": metadata(), "data": { "favorites": [], "watchlist": [] } });
        let report = validate(&dataset);
        assert!(!report.is_valid);
        assert!(!report.errors.is_empty());
        assert!(report.errors[0].contains("watchHistory"));
    }

    #[test]
    fn test_empty_history_with_missing_favorites_is_valid() {
        let dataset = json!({ "metadata": metadata(), "data": { "watchHistory": [], "watchlist": [] } });
        let report = validate(&dataset);
        assert!(report.is_valid);
        assert!(report.errors.is_empty());
        assert!(report.warnings.iter().any(|w| w.contains("favorites")));
    }

    #[test]
    fn test_missing_favorites_rejected_when_not_allowed() {
        let dataset = json!({ "metadata": metadata(), "data": { "watchHistory": [], "watchlist": [] } });
        let options = ValidationOptions { allow_missing_collections: false };
        let report = validate_with(&dataset, &options);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("favorites")));
    }

    #[test]
    fn test_non_object_and_missing_data() {
        let report = validate(&json!([1, 2, 3]));
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("an array"));

        let report = validate(&json!({ "metadata": metadata() }));
        assert!(!report.is_valid);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_non_array_category_is_an_error() {
        let dataset = json!({ "metadata": metadata(), "data": { "watchHistory": {}, "favorites": [], "watchlist": [] } });
        let report = validate(&dataset);
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("must be an array"));
    }

    #[test]
    fn test_bad_items_become_a_counted_warning() {
        let dataset = json!({
            "metadata": metadata(),
            "data": {
                "watchHistory": [history_item(1), { "media_type": "movie", "created_at": "2024-01-01T00:00:00Z" }],
                "favorites": [{ "media_id": 5, "media_type": "movie" }, { "media_id": null, "media_type": "movie" }, "junk"],
                "watchlist": []
            }
        });
        let report = validate(&dataset);
        assert!(report.is_valid);
        assert_eq!(report.usable.watch_history, 1);
        assert_eq!(report.usable.favorites, 1);
        assert!(report.warnings.iter().any(|w| w.starts_with("1 of 2 data.watchHistory")));
        assert!(report.warnings.iter().any(|w| w.starts_with("2 of 3 data.favorites")));
    }

    #[test]
    fn test_no_usable_items_is_invalid() {
        let dataset = json!({
            "metadata": metadata(),
            "data": {
                "watchHistory": [{ "media_id": "550", "media_type": "movie" }],
                "favorites": [{ "media_type": "podcast", "media_id": 1 }],
                "watchlist": []
            }
        });
        let report = validate(&dataset);
        assert!(!report.is_valid);
        assert_eq!(report.errors, vec!["No valid items found in backup".to_string()]);
    }

    #[test]
    fn test_history_requires_parseable_created_at() {
        let dataset = json!({
            "metadata": metadata(),
            "data": {
                "watchHistory": [history_item(1), { "media_id": 2, "media_type": "movie", "created_at": "soon" }],
                "favorites": [],
                "watchlist": []
            }
        });
        let report = validate(&dataset);
        assert_eq!(report.usable.watch_history, 1);
    }

    #[test]
    fn test_tv_without_episode_numbers_warns() {
        let dataset = json!({
            "metadata": metadata(),
            "data": {
                "watchHistory": [{ "media_id": 1399, "media_type": "tv", "created_at": "2024-01-01T00:00:00Z" }],
                "favorites": [],
                "watchlist": []
            }
        });
        let report = validate(&dataset);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("no season/episode")));
    }

    #[test]
    fn test_usable_counts_match_what_restore_accepts() {
        let dataset = json!({
            "metadata": metadata(),
            "data": {
                "watchHistory": [
                    history_item(1),
                    { "media_id": 2, "media_type": "movie", "title": null, "duration": null, "created_at": "2024-01-01T00:00:00Z" },
                    { "media_id": 3, "media_type": "tv", "created_at": "2024-01-01T00:00:00Z" },
                    { "media_id": 4, "media_type": "tv", "season": "1", "episode": 2, "created_at": "2024-01-01T00:00:00Z" },
                    {
                        "media_id": 5, "media_type": "tv", "season": 1, "episode": 1, "created_at": "2024-01-01T00:00:00Z",
                        "episodes_watched": [{ "season": 1, "episode": 1 }]
                    }
                ],
                "favorites": [
                    { "media_id": 6, "media_type": "movie", "title": null },
                    { "media_id": 7, "media_type": "podcast" }
                ],
                "watchlist": [{ "media_id": 8, "media_type": "tv", "created_at": null }]
            }
        });

        let report = validate(&dataset);
        let restored = restore(&dataset, &Collections::default());
        assert!(report.is_valid);
        assert!(restored.success);

        for collection in Collection::ALL {
            let stats = restored.stats.get(collection);
            let usable = match collection {
                Collection::WatchHistory => report.usable.watch_history,
                Collection::Favorites => report.usable.favorites,
                Collection::Watchlist => report.usable.watchlist,
            };
            assert_eq!(usable, stats.added + stats.updated, "{}", collection);
        }
        assert_eq!(report.usable.watch_history, 3);
        assert!(report.warnings.iter().any(|w| w.starts_with("2 of 5 data.watchHistory")));
        assert!(report.warnings.iter().any(|w| w.starts_with("1 tv items") && w.contains("no season/episode")));
    }

    #[test]
    fn test_metadata_warnings() {
        let dataset = json!({
            "metadata": { "createdAt": "whenever", "version": "2.3", "itemCounts": { "watchHistory": 5, "favorites": 0 } },
            "data": { "watchHistory": [history_item(1)], "favorites": [], "watchlist": [] }
        });
        let report = validate(&dataset);
        assert!(report.is_valid);
        assert!(report.warnings.iter().any(|w| w.contains("createdAt")));
        assert!(report.warnings.iter().any(|w| w.contains("Unknown backup version 2.3")));
        assert!(report.warnings.iter().any(|w| w.contains("declares 5 watchHistory items")));
        assert!(!report.warnings.iter().any(|w| w.contains("favorites items")));
    }

    #[test]
    fn test_missing_metadata_only_warns() {
        let dataset = json!({ "data": { "watchHistory": [history_item(1)], "favorites": [], "watchlist": [] } });
        let report = validate(&dataset);
        assert!(report.is_valid);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let dataset = json!({ "data": { "watchHistory": [history_item(1), "junk"] } });
        let before = dataset.clone();
        let _ = validate(&dataset);
        assert_eq!(dataset, before);
    }
}
