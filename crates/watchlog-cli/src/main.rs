use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{clear, config, episodes, export, history, import, lists, validate, watch, AppContext};
use std::path::PathBuf;
use watchlog_config::{Config, PathManager};
use watchlog_models::{Collection, MediaType};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "watchlog")]
#[command(about = "Watchlog - Keep one clean watch history and move it between devices")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl From<MediaKind> for MediaType {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Movie => MediaType::Movie,
            MediaKind::Tv => MediaType::Tv,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Record a watch event
    #[command(long_about = "Record that a movie or episode was watched. By default the event is merged like any other update: stale events are ignored and episodes you already tracked keep their progress. Use --live for playback progress, which always overwrites.")]
    Watch {
        #[arg(value_enum)]
        media_type: MediaKind,

        media_id: u64,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long)]
        season: Option<u32>,

        #[arg(long)]
        episode: Option<u32>,

        /// Playback position in seconds
        #[arg(long, default_value_t = 0.0)]
        position: f64,

        /// Total duration in seconds
        #[arg(long, default_value_t = 0.0)]
        duration: f64,

        /// Preferred playback source to remember for this title
        #[arg(long)]
        source: Option<String>,

        /// Treat the event as live playback progress
        #[arg(long, action = ArgAction::SetTrue)]
        live: bool,
    },
    /// Show the continue-watching list
    History {
        /// Maximum number of titles to show (defaults to history.continue_watching_limit)
        #[arg(long)]
        limit: Option<usize>,

        /// Show every title
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "limit")]
        all: bool,
    },
    /// Show tracked episodes of a show
    Episodes {
        media_id: u64,

        #[arg(long, requires = "episode")]
        season: Option<u32>,

        #[arg(long, requires = "season")]
        episode: Option<u32>,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        cmd: ListCommands,
    },
    /// Manage the watchlist
    Watchlist {
        #[command(subcommand)]
        cmd: ListCommands,
    },
    /// Remove a title from watch history
    Remove {
        #[arg(value_enum)]
        media_type: MediaKind,

        media_id: u64,
    },
    /// Clear stored collections
    #[command(long_about = "Clear stored collections. Use --history, --favorites, --watchlist, or --all to clear everything.")]
    Clear {
        /// Clear all collections
        #[arg(long, action = ArgAction::SetTrue)]
        all: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        history: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        favorites: bool,

        #[arg(long, action = ArgAction::SetTrue)]
        watchlist: bool,
    },
    /// Check a backup file without importing it
    Validate {
        file: PathBuf,
    },
    /// Merge a backup file into local collections
    #[command(long_about = "Validate a backup file and merge it into local collections. Items that cannot be restored are skipped and counted; everything else is merged with the same rules as live updates.")]
    Import {
        file: PathBuf,

        /// Show what would change without writing anything
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Write local collections to a backup file
    Export {
        /// Destination (defaults to a timestamped file in the backups directory)
        file: Option<PathBuf>,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// Add or refresh an item
    Add {
        #[arg(value_enum)]
        media_type: MediaKind,

        media_id: u64,

        #[arg(long, default_value = "")]
        title: String,
    },
    /// Remove an item
    Remove {
        #[arg(value_enum)]
        media_type: MediaKind,

        media_id: u64,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let base_paths = PathManager::default();
    let config = Config::load_or_default(&base_paths.config_file())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", base_paths.config_file().display(), e))?;
    config.validate().map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    logging::init_logging_with_file(cli.verbose, cli.quiet, &config.logging.level, config.logging.file.clone())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let paths = base_paths.with_data_dir(config.storage.data_dir.clone());
    let ctx = AppContext::new(paths, config);

    match cli.command {
        Commands::Watch {
            media_type,
            media_id,
            title,
            season,
            episode,
            position,
            duration,
            source,
            live,
        } => {
            let event = watch::WatchEvent {
                media_type: media_type.into(),
                media_id,
                title,
                season,
                episode,
                position,
                duration,
                source,
            };
            watch::run_watch(&ctx, event, live, &output).await
        }
        Commands::History { limit, all } => history::run_history(&ctx, limit, all, &output).await,
        Commands::Episodes { media_id, season, episode } => episodes::run_episodes(&ctx, media_id, season, episode, &output).await,
        Commands::Favorites { cmd } => lists::run_list(&ctx, Collection::Favorites, cmd, &output).await,
        Commands::Watchlist { cmd } => lists::run_list(&ctx, Collection::Watchlist, cmd, &output).await,
        Commands::Remove { media_type, media_id } => clear::run_remove(&ctx, media_type.into(), media_id, &output).await,
        Commands::Clear { all, history, favorites, watchlist } => clear::run_clear(&ctx, all, history, favorites, watchlist, &output).await,
        Commands::Validate { file } => validate::run_validate(&ctx, &file, &output).await,
        Commands::Import { file, dry_run } => import::run_import(&ctx, &file, dry_run, &output).await,
        Commands::Export { file } => export::run_export(&ctx, file, &output).await,
        Commands::Config { cmd } => config::run_config(&ctx, cmd, &output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_watch_command() {
        let cli = Cli::try_parse_from(["watchlog", "watch", "tv", "1399", "--season", "1", "--episode", "4", "--live"]).unwrap();
        match cli.command {
            Commands::Watch { media_type, media_id, season, episode, live, .. } => {
                assert_eq!(MediaType::from(media_type), MediaType::Tv);
                assert_eq!(media_id, 1399);
                assert_eq!((season, episode), (Some(1), Some(4)));
                assert!(live);
            }
            _ => panic!("expected watch command"),
        }
    }

    #[test]
    fn test_episodes_requires_both_coordinates() {
        assert!(Cli::try_parse_from(["watchlog", "episodes", "1399", "--season", "1"]).is_err());
        assert!(Cli::try_parse_from(["watchlog", "episodes", "1399", "--season", "1", "--episode", "2"]).is_ok());
    }

    #[test]
    fn test_global_output_flag() {
        let cli = Cli::try_parse_from(["watchlog", "--output", "json-pretty", "history", "--all"]).unwrap();
        assert_eq!(cli.output, output::OutputFormat::JsonPretty);
    }
}
