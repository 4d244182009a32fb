use super::AppContext;
use crate::output::Output;
use color_eyre::eyre::Context;
use color_eyre::Result;
use watchlog_core::{identity_key, HistoryStore};
use watchlog_models::{Collection, MediaType};

pub async fn run_remove(ctx: &AppContext, media_type: MediaType, media_id: u64, output: &Output) -> Result<()> {
    let mut lock = ctx.store_lock()?;
    let _guard = lock.write().wrap_err("Failed to lock the data directory")?;
    let store = ctx.store();
    let removed = store
        .delete_media(Collection::WatchHistory, media_type, media_id)
        .wrap_err("Failed to update watch history")?;

    let key = identity_key(media_type, media_id);
    if removed == 0 {
        output.warn(format!("{} is not in watch history", key));
    } else {
        output.success(format!("Removed {} from watch history", key));
    }
    Ok(())
}

pub async fn run_clear(
    ctx: &AppContext,
    all: bool,
    history: bool,
    favorites: bool,
    watchlist: bool,
    output: &Output,
) -> Result<()> {
    let targets: Vec<Collection> = if all {
        Collection::ALL.to_vec()
    } else {
        Collection::ALL
            .into_iter()
            .filter(|c| match c {
                Collection::WatchHistory => history,
                Collection::Favorites => favorites,
                Collection::Watchlist => watchlist,
            })
            .collect()
    };

    if targets.is_empty() {
        output.warn("No clear option specified. Use --history, --favorites, --watchlist, or --all");
        output.info("\nExample: watchlog clear --history");
        return Ok(());
    }

    let mut lock = ctx.store_lock()?;
    let _guard = lock.write().wrap_err("Failed to lock the data directory")?;
    let store = ctx.store();
    for collection in targets {
        let removed = store
            .clear(collection)
            .wrap_err_with(|| format!("Failed to clear {}", collection))?;
        output.success(format!("Cleared {} ({} items)", collection, removed));
    }
    Ok(())
}
