use super::{display_progress, display_time, AppContext};
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use serde_json::json;
use watchlog_core::{find_episode, identity_key, tracked_episodes, EpisodeKey, HistoryStore, Identifiable};
use watchlog_models::{EpisodeProgress, MediaType};

pub async fn run_episodes(
    ctx: &AppContext,
    media_id: u64,
    season: Option<u32>,
    episode: Option<u32>,
    output: &Output,
) -> Result<()> {
    let store = ctx.store();
    let history = store.fetch_all().wrap_err("Failed to load watch history")?.watch_history;

    let key = identity_key(MediaType::Tv, media_id);
    let Some(record) = history.iter().find(|r| r.identity_key() == key) else {
        return Err(color_eyre::eyre::eyre!("No watch history for {}", key));
    };

    if let (Some(season), Some(episode)) = (season, episode) {
        let entry = find_episode(record, season, episode);
        if !output.is_human() {
            output.json(&json!({ "type": "episode", "key": key, "episode": entry }));
            return Ok(());
        }
        match entry {
            Some(entry) => output.info(format!(
                "{} {}: {} watched, last on {}",
                record.title,
                EpisodeKey::of_entry(&entry),
                display_progress(entry.watch_position, entry.duration),
                display_time(&entry.watched_at)
            )),
            None => output.info(format!(
                "{} {} has not been watched",
                record.title,
                EpisodeKey::new(season, episode)
            )),
        }
        return Ok(());
    }

    let mut episodes: Vec<EpisodeProgress> = tracked_episodes(record);
    episodes.sort_by_key(|e| (e.season, e.episode));

    if !output.is_human() {
        output.json(&json!({ "type": "episodes", "key": key, "episodes": episodes }));
        return Ok(());
    }

    if episodes.is_empty() {
        output.info(format!("No episodes tracked for {}", record.title));
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Episode").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Progress").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Watched").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    for entry in &episodes {
        table.add_row(vec![
            Cell::new(EpisodeKey::of_entry(entry).to_string()),
            Cell::new(display_progress(entry.watch_position, entry.duration)),
            Cell::new(display_time(&entry.watched_at)),
        ]);
    }

    output.info(format!("{} ({} episodes)", record.title, episodes.len()));
    output.block(table);
    Ok(())
}
