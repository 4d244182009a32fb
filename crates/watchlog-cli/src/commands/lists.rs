use super::AppContext;
use crate::output::Output;
use crate::ListCommands;
use chrono::{SecondsFormat, Utc};
use color_eyre::eyre::Context;
use color_eyre::Result;
use serde_json::json;
use watchlog_core::{identity_key, HistoryStore};
use watchlog_models::{Collection, MediaItem, MediaType};

pub async fn run_list(ctx: &AppContext, collection: Collection, cmd: ListCommands, output: &Output) -> Result<()> {
    let mut lock = ctx.store_lock()?;
    let _guard = lock.write().wrap_err("Failed to lock the data directory")?;
    let store = ctx.store();

    match cmd {
        ListCommands::Add { media_type, media_id, title } => {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            let item = MediaItem::new(media_type.into(), media_id, title, now);
            let stored = store
                .persist_item(collection, &item)
                .wrap_err_with(|| format!("Failed to save {}", collection))?;

            if output.is_human() {
                output.success(format!("Added {} to {}", identity_key(stored.media_type, stored.media_id), collection));
            } else {
                output.json(&json!({ "type": "added", "collection": collection, "item": stored }));
            }
        }
        ListCommands::Remove { media_type, media_id } => {
            let media_type: MediaType = media_type.into();
            let removed = store
                .delete_media(collection, media_type, media_id)
                .wrap_err_with(|| format!("Failed to update {}", collection))?;

            let key = identity_key(media_type, media_id);
            if removed == 0 {
                output.warn(format!("{} is not in {}", key, collection));
            } else {
                output.success(format!("Removed {} from {}", key, collection));
            }
        }
    }
    Ok(())
}
