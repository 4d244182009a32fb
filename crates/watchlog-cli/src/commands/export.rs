use super::AppContext;
use crate::output::Output;
use chrono::Utc;
use color_eyre::eyre::Context;
use color_eyre::Result;
use serde_json::json;
use std::path::PathBuf;
use watchlog_core::{create_backup, write_backup_file, HistoryStore};

pub async fn run_export(ctx: &AppContext, file: Option<PathBuf>, output: &Output) -> Result<()> {
    let now = Utc::now();
    let path = file.unwrap_or_else(|| {
        ctx.paths
            .backups_dir()
            .join(format!("watchlog-backup-{}.json", now.format("%Y%m%d-%H%M%S")))
    });

    let store = ctx.store();
    let collections = store.fetch_all().wrap_err("Failed to load local collections")?;
    let dataset = create_backup(&collections, now);
    write_backup_file(&path, &dataset).wrap_err_with(|| format!("Failed to write backup {}", path.display()))?;

    if output.is_human() {
        output.success(format!(
            "Exported {} history, {} favorites, {} watchlist items to {}",
            collections.watch_history.len(),
            collections.favorites.len(),
            collections.watchlist.len(),
            path.display()
        ));
    } else {
        output.json(&json!({
            "type": "export",
            "file": path.display().to_string(),
            "itemCounts": dataset.metadata.item_counts,
        }));
    }
    Ok(())
}
