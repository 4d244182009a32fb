use super::validate::print_report;
use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use serde_json::json;
use std::path::Path;
use tracing::info;
use watchlog_core::{read_backup_file, restore, validate_with, HistoryStore, RestoreStats};
use watchlog_models::Collection;

pub async fn run_import(ctx: &AppContext, file: &Path, dry_run: bool, output: &Output) -> Result<()> {
    // Held until the merged collections are written, across processes
    let mut lock = ctx.store_lock()?;
    let Some(_guard) = lock.try_write().wrap_err("Failed to lock the data directory")? else {
        return Err(color_eyre::eyre::eyre!(
            "A restore is already in progress (another watchlog process holds the data directory)"
        ));
    };

    let value = read_backup_file(file, ctx.config.backup.max_size_bytes())
        .wrap_err_with(|| format!("Failed to read backup {}", file.display()))?;

    let report = validate_with(&value, &ctx.validation_options());
    if output.is_human() {
        print_report(&report, output);
    }
    if !report.is_valid {
        return Err(color_eyre::eyre::eyre!(
            "Backup failed validation: {}",
            report.errors.join("; ")
        ));
    }

    let store = ctx.store();
    let local = store.fetch_all().wrap_err("Failed to load local collections")?;
    let result = restore(&value, &local);
    if !result.success {
        return Err(color_eyre::eyre::eyre!("{}", result.message));
    }

    if dry_run {
        info!("Dry run: {}", result.message);
    } else {
        store
            .replace_all(&result.collections)
            .wrap_err("Failed to save restored collections")?;
        info!("Import from {:?} complete: {}", file, result.message);
    }

    if output.is_human() {
        output.block(stats_table(&result.stats));
        if dry_run {
            output.warn(format!("Dry run, nothing written. {}", result.message));
        } else {
            output.success(&result.message);
        }
    } else {
        output.json(&json!({
            "type": "import",
            "dryRun": dry_run,
            "message": result.message,
            "stats": result.stats,
            "warnings": report.warnings,
        }));
    }
    Ok(())
}

fn stats_table(stats: &RestoreStats) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Collection").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Added").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Updated").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Skipped").add_attribute(comfy_table::Attribute::Bold),
    ]);
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    for collection in Collection::ALL {
        let s = stats.get(collection);
        let skipped = if s.errors > 0 {
            Cell::new(s.errors).fg(comfy_table::Color::Yellow)
        } else {
            Cell::new(s.errors)
        };
        table.add_row(vec![
            Cell::new(collection.to_string()),
            Cell::new(s.added),
            Cell::new(s.updated),
            skipped,
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;
    use watchlog_config::{Config, PathManager};
    use watchlog_core::{create_backup, write_backup_file};
    use watchlog_models::{Collections, WatchRecord};

    fn context(base: &TempDir) -> AppContext {
        AppContext::new(PathManager::from_base(base.path().to_path_buf()), Config::default())
    }

    fn backup_file(base: &TempDir) -> std::path::PathBuf {
        let collections = Collections {
            watch_history: vec![WatchRecord::movie(603, "The Matrix", "2024-03-01T20:00:00.000Z")],
            ..Default::default()
        };
        let path = base.path().join("backup.json");
        let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        write_backup_file(&path, &create_backup(&collections, now)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_import_refused_while_data_dir_is_locked() {
        let base = TempDir::new().unwrap();
        let ctx = context(&base);
        let file = backup_file(&base);
        let output = Output::new(OutputFormat::Json, true);

        let mut held = ctx.store_lock().unwrap();
        let guard = held.try_write().unwrap().expect("lock is free");

        let err = run_import(&ctx, &file, false, &output).await.unwrap_err();
        assert!(err.to_string().contains("already in progress"));
        assert!(ctx.store().fetch_all().unwrap().watch_history.is_empty());

        drop(guard);
        run_import(&ctx, &file, false, &output).await.unwrap();
        assert_eq!(ctx.store().fetch_all().unwrap().watch_history.len(), 1);
    }
}
