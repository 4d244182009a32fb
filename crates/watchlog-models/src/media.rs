use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "movie" => Some(MediaType::Movie),
            "tv" => Some(MediaType::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A saved title without playback state (favorites and watchlist entries)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaItem {
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
    #[serde(default, deserialize_with = "crate::nullable::null_as_default")]
    pub created_at: String,
}

impl MediaItem {
    pub fn new(media_type: MediaType, media_id: u64, title: impl Into<String>, created_at: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            media_id,
            media_type,
            title: title.into(),
            poster_path: None,
            backdrop_path: None,
            overview: None,
            created_at: created_at.into(),
        }
    }

    pub fn created_time(&self) -> Option<DateTime<Utc>> {
        crate::parse_timestamp(&self.created_at)
    }
}
