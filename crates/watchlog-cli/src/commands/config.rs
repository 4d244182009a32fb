use super::AppContext;
use crate::output::{Output, OutputFormat};
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use watchlog_config::Config;

pub async fn run_config(ctx: &AppContext, cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show_config(ctx, output).await,
        ConfigCommands::Init { force } => init_config(ctx, force, output).await,
    }
}

async fn show_config(ctx: &AppContext, output: &Output) -> Result<()> {
    let config_file = ctx.paths.config_file();
    let config = &ctx.config;

    match output.format() {
        OutputFormat::Human => {
            if output.is_quiet() {
                return Ok(());
            }

            if !config_file.exists() {
                output.warn(format!("Configuration file not found at: {} (using defaults)", config_file.display()));
                output.info("Run 'watchlog config init' to create one.");
            }

            let mut table = Table::new();
            table.set_header(vec![
                Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
                Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
            ]);
            table.add_row(vec![Cell::new("Config File"), Cell::new(config_file.display().to_string())]);
            table.add_row(vec![Cell::new("Data Directory"), Cell::new(ctx.paths.data_dir().display().to_string())]);
            table.add_row(vec![Cell::new("Max Backup Size"), Cell::new(format!("{} MB", config.backup.max_size_mb))]);
            table.add_row(vec![
                Cell::new("Allow Missing Collections"),
                Cell::new(if config.backup.allow_missing_collections { "✓".green().to_string() } else { "✗".red().to_string() }),
            ]);
            table.add_row(vec![
                Cell::new("Continue Watching Limit"),
                Cell::new(config.history.continue_watching_limit),
            ]);
            table.add_row(vec![Cell::new("Log Level"), Cell::new(&config.logging.level)]);
            table.add_row(vec![
                Cell::new("Log File"),
                Cell::new(
                    config
                        .logging
                        .file
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "stderr".to_string()),
                ),
            ]);
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

            println!("\n{}", "Configuration".bright_cyan().bold());
            println!("{}", table);
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "configFile": config_file.display().to_string(),
                "exists": config_file.exists(),
                "dataDir": ctx.paths.data_dir().display().to_string(),
                "config": serde_json::to_value(config)?,
            }));
        }
    }
    Ok(())
}

async fn init_config(ctx: &AppContext, force: bool, output: &Output) -> Result<()> {
    let config_file = ctx.paths.config_file();
    if config_file.exists() && !force {
        output.warn(format!("Configuration already exists at: {}", config_file.display()));
        output.info("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ctx.paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create directories: {}", e))?;
    Config::default()
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to write config to {}: {}", config_file.display(), e))?;

    output.success(format!("Wrote default configuration to {}", config_file.display()));
    Ok(())
}
