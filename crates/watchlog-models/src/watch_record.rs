use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media::MediaType;

/// Progress for a single episode inside a show's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeProgress {
    pub season: u32,
    pub episode: u32,
    #[serde(default, deserialize_with = "crate::nullable::null_as_default")]
    pub watch_position: f64,
    #[serde(default, deserialize_with = "crate::nullable::null_as_default")]
    pub duration: f64,
    pub watched_at: String,
}

impl EpisodeProgress {
    pub fn watched_time(&self) -> Option<DateTime<Utc>> {
        crate::parse_timestamp(&self.watched_at)
    }
}

/// One canonical watch-history entry per title.
///
/// For shows, `season`/`episode`/`watch_position`/`duration` are the head:
/// the most recently watched episode. The full per-episode history lives in
/// `episodes_watched`, which is absent on records written before episode
/// tracking existed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchRecord {
    #[serde(default, deserialize_with = "crate::nullable::null_as_default")]
    pub id: String,
    pub media_id: u64,
    pub media_type: MediaType,
    #[serde(default, deserialize_with = "crate::nullable::null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    #[serde(default, deserialize_with = "crate::nullable::null_as_default")]
    pub watch_position: f64,
    #[serde(default, deserialize_with = "crate::nullable::null_as_default")]
    pub duration: f64,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_watched_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episodes_watched: Option<Vec<EpisodeProgress>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_source: Option<String>,
}

impl WatchRecord {
    pub fn movie(media_id: u64, title: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self::blank(MediaType::Movie, media_id, title.into(), created_at.into())
    }

    pub fn episode(
        media_id: u64,
        title: impl Into<String>,
        season: u32,
        episode: u32,
        created_at: impl Into<String>,
    ) -> Self {
        let mut record = Self::blank(MediaType::Tv, media_id, title.into(), created_at.into());
        record.season = Some(season);
        record.episode = Some(episode);
        record
    }

    fn blank(media_type: MediaType, media_id: u64, title: String, created_at: String) -> Self {
        Self {
            id: String::new(),
            media_id,
            media_type,
            title,
            poster_path: None,
            backdrop_path: None,
            overview: None,
            season: None,
            episode: None,
            watch_position: 0.0,
            duration: 0.0,
            created_at,
            last_watched_at: None,
            episodes_watched: None,
            preferred_source: None,
        }
    }

    pub fn with_progress(mut self, watch_position: f64, duration: f64) -> Self {
        self.watch_position = watch_position;
        self.duration = duration;
        self
    }

    pub fn is_tv(&self) -> bool {
        self.media_type == MediaType::Tv
    }

    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        crate::parse_timestamp(&self.created_at)
    }

    pub fn last_watched_time(&self) -> Option<DateTime<Utc>> {
        self.last_watched_at.as_deref().and_then(crate::parse_timestamp)
    }

    /// The head fields expressed as an episode entry, if the head names an episode
    pub fn head_episode(&self) -> Option<EpisodeProgress> {
        let (season, episode) = (self.season?, self.episode?);
        Some(EpisodeProgress {
            season,
            episode,
            watch_position: self.watch_position,
            duration: self.duration,
            watched_at: self
                .last_watched_at
                .clone()
                .unwrap_or_else(|| self.created_at.clone()),
        })
    }

    /// Fraction of the head item watched, clamped to 0..=1
    pub fn progress_ratio(&self) -> f64 {
        if self.duration <= 0.0 {
            return 0.0;
        }
        (self.watch_position / self.duration).clamp(0.0, 1.0)
    }
}
