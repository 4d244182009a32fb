use super::AppContext;
use crate::output::Output;
use chrono::{SecondsFormat, Utc};
use color_eyre::eyre::Context;
use color_eyre::Result;
use serde_json::json;
use tracing::info;
use watchlog_core::{apply_live_progress, apply_update, HistoryStore, Identifiable};
use watchlog_models::{MediaType, WatchRecord};

pub struct WatchEvent {
    pub media_type: MediaType,
    pub media_id: u64,
    pub title: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub position: f64,
    pub duration: f64,
    pub source: Option<String>,
}

impl WatchEvent {
    fn into_record(self, created_at: String) -> WatchRecord {
        let mut record = match self.media_type {
            MediaType::Movie => WatchRecord::movie(self.media_id, self.title, created_at),
            MediaType::Tv => WatchRecord::episode(
                self.media_id,
                self.title,
                self.season.unwrap_or(0),
                self.episode.unwrap_or(0),
                created_at,
            ),
        }
        .with_progress(self.position, self.duration);
        record.preferred_source = self.source;
        record
    }
}

pub async fn run_watch(ctx: &AppContext, event: WatchEvent, live: bool, output: &Output) -> Result<()> {
    if event.media_type == MediaType::Tv && (event.season.is_none() || event.episode.is_none()) {
        if live {
            return Err(color_eyre::eyre::eyre!("--season and --episode are required for live TV progress"));
        }
        output.warn("No --season/--episode given; recording as S00E00");
    }

    let mut lock = ctx.store_lock()?;
    let _guard = lock.write().wrap_err("Failed to lock the data directory")?;

    let store = ctx.store();
    let history = store.fetch_all().wrap_err("Failed to load watch history")?.watch_history;

    let now = Utc::now();
    let incoming = event.into_record(now.to_rfc3339_opts(SecondsFormat::Millis, true));

    let outcome = if live {
        apply_live_progress(&history, &incoming, now)
    } else {
        apply_update(&history, &incoming)
    };

    let Some(touched) = outcome.touched else {
        info!("Ignored stale update for {}", incoming.identity_key());
        output.info(format!("Nothing changed for {}", incoming.identity_key()));
        return Ok(());
    };

    let stored = store.persist_record(&touched).wrap_err("Failed to save watch history")?;

    if output.is_human() {
        let what = match (stored.media_type, stored.season, stored.episode) {
            (MediaType::Tv, Some(s), Some(e)) => format!("{} S{:02}E{:02}", stored.title, s, e),
            _ => stored.title.clone(),
        };
        output.success(format!("Recorded {} ({})", what, stored.identity_key()));
    } else {
        output.json(&json!({ "type": "watch", "record": stored }));
    }
    Ok(())
}
