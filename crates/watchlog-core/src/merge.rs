// Incremental merge of single watch events into a history collection

use tracing::{debug, trace};
use watchlog_models::{parse_timestamp, EpisodeProgress, MediaType, WatchRecord};
use crate::identity::{find_index, EpisodeKey, Identifiable};

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    pub collection: Vec<WatchRecord>,
    /// The created or merged record, `None` when the update was stale and discarded
    pub touched: Option<WatchRecord>,
}

/// Fold one incoming record into a history collection without mutating it.
///
/// Movies follow last-write-wins on `created_at`. Shows keep one row per
/// title: unseen episodes are appended to `episodes_watched`, already-tracked
/// episodes are left alone, and the head only advances when the incoming
/// `created_at` is strictly newer. The touched record is moved to the front.
pub fn apply_update(collection: &[WatchRecord], incoming: &WatchRecord) -> UpdateOutcome {
    let mut collection = collection.to_vec();
    let touched = merge_into(&mut collection, incoming).map(|idx| collection[idx].clone());
    UpdateOutcome { collection, touched }
}

/// In-place form of [`apply_update`]. Returns the index of the touched record
/// (always 0 when something changed).
pub fn merge_into(collection: &mut Vec<WatchRecord>, incoming: &WatchRecord) -> Option<usize> {
    let Some(idx) = find_index(collection.as_slice(), incoming) else {
        trace!("merge_into: new entry {}", incoming.identity_key());
        collection.insert(0, normalize_new_record(incoming));
        return Some(0);
    };

    let existing = &collection[idx];
    let merged = match incoming.media_type {
        MediaType::Movie => merge_movie(existing, incoming),
        MediaType::Tv => merge_show(existing, incoming),
    };

    let merged = merged?;
    collection.remove(idx);
    collection.insert(0, merged);
    Some(0)
}

/// Shape a record that has no counterpart in the collection yet.
///
/// Shows get their episode list seeded (from the incoming list if it carries
/// one, otherwise exactly the head episode) and `last_watched_at` defaulted.
pub fn normalize_new_record(incoming: &WatchRecord) -> WatchRecord {
    let mut record = incoming.clone();
    if record.media_type == MediaType::Tv {
        let head = EpisodeKey::of_head(incoming);
        record.season = Some(head.season);
        record.episode = Some(head.episode);
        record.episodes_watched = Some(incoming_episodes(incoming));
        if record.last_watched_time() < record.created_time() {
            record.last_watched_at = Some(record.created_at.clone());
        }
    } else if record.last_watched_at.is_some() && record.last_watched_time() < record.created_time() {
        record.last_watched_at = Some(record.created_at.clone());
    }
    record
}

/// Episode list of a record. Shows written before episode tracking report
/// their head as the only entry, with missing numbers read as 0.
pub fn tracked_episodes(record: &WatchRecord) -> Vec<EpisodeProgress> {
    if let Some(episodes) = &record.episodes_watched {
        return episodes.clone();
    }
    if !record.is_tv() {
        return Vec::new();
    }
    let head = EpisodeKey::of_head(record);
    vec![EpisodeProgress {
        season: head.season,
        episode: head.episode,
        watch_position: record.watch_position,
        duration: record.duration,
        watched_at: record
            .last_watched_at
            .clone()
            .unwrap_or_else(|| record.created_at.clone()),
    }]
}

/// `true` when timestamp `a` is strictly newer than `b`. Unparseable values
/// compare older than any valid one.
pub(crate) fn is_newer(a: &str, b: &str) -> bool {
    parse_timestamp(a) > parse_timestamp(b)
}

fn merge_movie(existing: &WatchRecord, incoming: &WatchRecord) -> Option<WatchRecord> {
    if !is_newer(&incoming.created_at, &existing.created_at) {
        debug!(
            "merge_movie: discarding stale update for {} ({} <= {})",
            incoming.identity_key(),
            incoming.created_at,
            existing.created_at
        );
        return None;
    }

    let mut merged = incoming.clone();
    carry_forward(&mut merged, existing);
    if existing.last_watched_time() > merged.last_watched_time() {
        merged.last_watched_at = existing.last_watched_at.clone();
    }
    if merged.last_watched_at.is_some() {
        let created_at = merged.created_at.clone();
        advance_last_watched(&mut merged, &created_at);
    }
    Some(merged)
}

fn merge_show(existing: &WatchRecord, incoming: &WatchRecord) -> Option<WatchRecord> {
    let mut merged = existing.clone();

    // Records written before episode tracking get their list built from the head once
    let mut episodes = merged.episodes_watched.take().unwrap_or_else(|| tracked_episodes(existing));

    for entry in incoming_episodes(incoming) {
        let key = EpisodeKey::of_entry(&entry);
        if episodes.iter().any(|e| key.matches(e)) {
            trace!("merge_show: {} {} already tracked", incoming.identity_key(), key);
            continue;
        }
        episodes.push(entry);
    }
    merged.episodes_watched = Some(episodes);

    if is_newer(&incoming.created_at, &existing.created_at) {
        let head = EpisodeKey::of_head(incoming);
        merged.season = Some(head.season);
        merged.episode = Some(head.episode);
        merged.watch_position = incoming.watch_position;
        merged.duration = incoming.duration;
        merged.created_at = incoming.created_at.clone();
        if incoming.preferred_source.is_some() {
            merged.preferred_source = incoming.preferred_source.clone();
        }
        fill_descriptive(&mut merged, incoming);
    }

    advance_last_watched(&mut merged, &incoming.created_at);

    if merged == *existing {
        debug!("merge_show: replay for {} changed nothing", incoming.identity_key());
        return None;
    }
    Some(merged)
}

/// Episodes an incoming record contributes: its own list (backup data) plus its
/// head episode, one entry per (season, episode), first occurrence kept.
fn incoming_episodes(incoming: &WatchRecord) -> Vec<EpisodeProgress> {
    let head_key = EpisodeKey::of_head(incoming);
    let head = EpisodeProgress {
        season: head_key.season,
        episode: head_key.episode,
        watch_position: incoming.watch_position,
        duration: incoming.duration,
        watched_at: incoming.created_at.clone(),
    };

    let mut entries: Vec<EpisodeProgress> = Vec::new();
    for entry in incoming.episodes_watched.iter().flatten().cloned().chain(std::iter::once(head)) {
        let key = EpisodeKey::of_entry(&entry);
        if !entries.iter().any(|e| key.matches(e)) {
            entries.push(entry);
        }
    }
    entries
}

/// Move `last_watched_at` forward to `candidate` when it is newer, and never
/// leave it behind the record's own `created_at`.
fn advance_last_watched(record: &mut WatchRecord, candidate: &str) {
    let current = record.last_watched_time().max(record.created_time());
    if parse_timestamp(candidate) > current {
        record.last_watched_at = Some(candidate.to_string());
    } else if record.created_time().is_some()
        && (record.last_watched_at.is_none() || record.last_watched_time() < record.created_time())
    {
        record.last_watched_at = Some(record.created_at.clone());
    }
}

/// Keep storage identity and the last playback source across a replacement
fn carry_forward(merged: &mut WatchRecord, existing: &WatchRecord) {
    if merged.id.is_empty() {
        merged.id = existing.id.clone();
    }
    if merged.preferred_source.is_none() {
        merged.preferred_source = existing.preferred_source.clone();
    }
    fill_descriptive(merged, existing);
}

/// Fill empty descriptive fields from `other`; existing values are not overwritten
fn fill_descriptive(record: &mut WatchRecord, other: &WatchRecord) {
    if record.title.is_empty() {
        record.title = other.title.clone();
    }
    if record.poster_path.is_none() {
        record.poster_path = other.poster_path.clone();
    }
    if record.backdrop_path.is_none() {
        record.backdrop_path = other.backdrop_path.clone();
    }
    if record.overview.is_none() {
        record.overview = other.overview.clone();
    }
}
