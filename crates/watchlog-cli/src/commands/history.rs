use super::{display_time, AppContext};
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use serde_json::json;
use watchlog_core::{deduplicate_with_report, HistoryStore};
use watchlog_models::{MediaType, WatchRecord};

pub async fn run_history(ctx: &AppContext, limit: Option<usize>, all: bool, output: &Output) -> Result<()> {
    let store = ctx.store();
    let collections = store.fetch_all().wrap_err("Failed to load watch history")?;

    let report = deduplicate_with_report(&collections.watch_history);
    if report.invalid_timestamps > 0 {
        output.warn(format!(
            "Skipped {} record(s) with an unreadable timestamp",
            report.invalid_timestamps
        ));
    }

    let limit = if all {
        usize::MAX
    } else {
        limit.unwrap_or(ctx.config.history.continue_watching_limit)
    };
    let records: Vec<&WatchRecord> = report.records.iter().take(limit).collect();

    if !output.is_human() {
        output.json(&json!({
            "type": "history",
            "total": report.records.len(),
            "records": records,
        }));
        return Ok(());
    }

    if records.is_empty() {
        output.info("No watch history yet");
        return Ok(());
    }

    output.block(history_table(&records));
    if records.len() < report.records.len() {
        output.info(format!(
            "Showing {} of {} titles (use --all to see everything)",
            records.len(),
            report.records.len()
        ));
    }
    Ok(())
}

fn history_table(records: &[&WatchRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Title").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Type").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Where").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Progress").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Last watched").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    for record in records {
        let position = match (record.media_type, record.season, record.episode) {
            (MediaType::Tv, Some(s), Some(e)) => format!("S{:02}E{:02}", s, e),
            _ => "-".to_string(),
        };
        let progress = if record.duration > 0.0 {
            format!("{:.0}%", record.progress_ratio() * 100.0)
        } else {
            "-".to_string()
        };
        let last_watched = record.last_watched_at.as_deref().unwrap_or(&record.created_at);
        let title = if record.title.is_empty() {
            record.media_id.to_string()
        } else {
            record.title.clone()
        };

        table.add_row(vec![
            Cell::new(title),
            Cell::new(record.media_type.as_str()),
            Cell::new(position),
            Cell::new(progress),
            Cell::new(display_time(last_watched)),
        ]);
    }
    table
}
