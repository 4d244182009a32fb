// Load-time normalization of raw history feeds

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;
use watchlog_models::WatchRecord;
use crate::identity::Identifiable;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupReport {
    pub records: Vec<WatchRecord>,
    /// Records dropped because `created_at` did not parse
    pub invalid_timestamps: usize,
    /// Older snapshots collapsed into a newer one for the same title
    pub duplicates_removed: usize,
}

/// Collapse a raw feed to one record per title, newest first.
///
/// This is a last-write-wins snapshot reducer: it never merges episode lists
/// across duplicates. Records with an unparseable `created_at` are dropped.
pub fn deduplicate(records: &[WatchRecord]) -> Vec<WatchRecord> {
    deduplicate_with_report(records).records
}

pub fn deduplicate_with_report(records: &[WatchRecord]) -> DedupReport {
    // identity key -> (input position, parsed created_at)
    let mut latest: HashMap<String, (usize, DateTime<Utc>)> = HashMap::new();
    let mut invalid_timestamps = 0;
    let mut valid = 0;

    for (position, record) in records.iter().enumerate() {
        let Some(created) = record.created_time() else {
            invalid_timestamps += 1;
            continue;
        };
        valid += 1;

        match latest.entry(record.identity_key()) {
            Entry::Occupied(mut slot) => {
                // Ties go to the later input
                if created >= slot.get().1 {
                    slot.insert((position, created));
                }
            }
            Entry::Vacant(slot) => {
                slot.insert((position, created));
            }
        }
    }

    let mut kept: Vec<(usize, DateTime<Utc>)> = latest.into_values().collect();
    kept.sort_by_key(|&(position, created)| (Reverse(created), position));

    let records: Vec<WatchRecord> = kept.into_iter().map(|(position, _)| records[position].clone()).collect();
    let duplicates_removed = valid - records.len();

    if invalid_timestamps > 0 || duplicates_removed > 0 {
        debug!(
            "deduplicate: kept={}, duplicates_removed={}, invalid_timestamps={}",
            records.len(),
            duplicates_removed,
            invalid_timestamps
        );
    }

    DedupReport {
        records,
        invalid_timestamps,
        duplicates_removed,
    }
}
