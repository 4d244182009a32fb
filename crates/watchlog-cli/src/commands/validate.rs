use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use serde_json::json;
use std::path::Path;
use watchlog_core::{read_backup_file, validate_with, ValidationReport};

pub async fn run_validate(ctx: &AppContext, file: &Path, output: &Output) -> Result<()> {
    let value = read_backup_file(file, ctx.config.backup.max_size_bytes())
        .wrap_err_with(|| format!("Failed to read backup {}", file.display()))?;
    let report = validate_with(&value, &ctx.validation_options());

    if output.is_human() {
        print_report(&report, output);
        if report.is_valid {
            output.success(format!("{} can be imported", file.display()));
        }
    } else {
        output.json(&json!({ "type": "validation", "file": file.display().to_string(), "report": report }));
    }

    if !report.is_valid {
        return Err(color_eyre::eyre::eyre!("{} is not a valid backup", file.display()));
    }
    Ok(())
}

/// Human rendering of a validation report: errors, then warnings, then usable counts
pub fn print_report(report: &ValidationReport, output: &Output) {
    for error in &report.errors {
        output.error(error);
    }
    for warning in &report.warnings {
        output.warn(warning);
    }
    output.info(format!(
        "Usable items: history={}, favorites={}, watchlist={}",
        report.usable.watch_history, report.usable.favorites, report.usable.watchlist
    ));
}
