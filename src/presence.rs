use crate::Bot;
use crate::horse::total_horses;
use log::{error, info};
use serenity::all::ActivityData;
use serenity::prelude::*;

// Update presence based on current stats
pub async fn update_presence(ctx: &Context, bot: &Bot) {
    let guild_count = ctx.cache.guilds().len();

    let horse_count = match total_horses(&bot.database).await {
        Ok(count) => count,
        Err(e) => {
            error!("Error counting horses: {:?}", e);
            return;
        }
    };

    let desc = format!("{} horses in {} servers", horse_count, guild_count);
    info!("Updating presence to: {}", desc);

    ctx.set_activity(Some(ActivityData::watching(desc)));
}
