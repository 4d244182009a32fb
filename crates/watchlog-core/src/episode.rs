// Episode lookup and live progress tracking

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::trace;
use watchlog_models::{EpisodeProgress, MediaType, WatchRecord};
use crate::identity::{find_index, EpisodeKey, Identifiable};
use crate::merge::{merge_into, tracked_episodes, UpdateOutcome};

/// Stored progress for one exact (season, episode) pair.
///
/// Records that predate episode tracking only know their head, so the head
/// is consulted when there is no list.
pub fn find_episode(record: &WatchRecord, season: u32, episode: u32) -> Option<EpisodeProgress> {
    let key = EpisodeKey::new(season, episode);
    tracked_episodes(record).into_iter().find(|e| key.matches(e))
}

/// Record live playback progress for an episode, stamped with the current time
pub fn update_episode(record: &WatchRecord, season: u32, episode: u32, position: f64, duration: f64) -> WatchRecord {
    update_episode_at(record, season, episode, position, duration, Utc::now())
}

/// Live progress always wins: the episode entry is overwritten (or appended),
/// and the head plus both timestamps move to `now` unconditionally.
pub fn update_episode_at(
    record: &WatchRecord,
    season: u32,
    episode: u32,
    position: f64,
    duration: f64,
    now: DateTime<Utc>,
) -> WatchRecord {
    let now = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let key = EpisodeKey::new(season, episode);
    let mut updated = record.clone();

    let mut episodes = updated.episodes_watched.take().unwrap_or_else(|| tracked_episodes(record));

    match episodes.iter_mut().find(|e| key.matches(e)) {
        Some(entry) => {
            entry.watch_position = position;
            entry.duration = duration;
            entry.watched_at = now.clone();
        }
        None => episodes.push(EpisodeProgress {
            season,
            episode,
            watch_position: position,
            duration,
            watched_at: now.clone(),
        }),
    }
    trace!("update_episode: {} {} at {}/{}", record.identity_key(), key, position, duration);

    updated.episodes_watched = Some(episodes);
    updated.season = Some(season);
    updated.episode = Some(episode);
    updated.watch_position = position;
    updated.duration = duration;
    updated.created_at = now.clone();
    updated.last_watched_at = Some(now);
    updated
}

/// Apply a live progress event to a collection.
///
/// Known titles are updated through the always-overwrite path; unknown titles
/// are created through the regular merge so a new show gets its episode list.
pub fn apply_live_progress(collection: &[WatchRecord], incoming: &WatchRecord, now: DateTime<Utc>) -> UpdateOutcome {
    let mut collection = collection.to_vec();

    let Some(idx) = find_index(collection.as_slice(), incoming) else {
        let mut created = incoming.clone();
        created.created_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        let touched = merge_into(&mut collection, &created).map(|i| collection[i].clone());
        return UpdateOutcome { collection, touched };
    };

    let existing = collection.remove(idx);
    let mut updated = match incoming.media_type {
        MediaType::Tv => {
            let key = EpisodeKey::of_head(incoming);
            update_episode_at(&existing, key.season, key.episode, incoming.watch_position, incoming.duration, now)
        }
        MediaType::Movie => {
            let mut movie = existing;
            movie.watch_position = incoming.watch_position;
            movie.duration = incoming.duration;
            let now = now.to_rfc3339_opts(SecondsFormat::Millis, true);
            movie.created_at = now.clone();
            movie.last_watched_at = Some(now);
            movie
        }
    };
    if incoming.preferred_source.is_some() {
        updated.preferred_source = incoming.preferred_source.clone();
    }

    collection.insert(0, updated.clone());
    UpdateOutcome {
        collection,
        touched: Some(updated),
    }
}
