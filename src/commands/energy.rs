use super::{database_error, notice};
use crate::Bot;
use crate::energy::horse_energy;
use crate::error::HorserError;
use crate::horse::find_horse_by_name;
use crate::time::unix_now;
use crate::utils::escape_markdown;
use log::error;
use serenity::all::CommandInteraction;
use serenity::prelude::*;

pub async fn handle_energy_command(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &Bot,
) -> Result<(), serenity::Error> {
    let Some(name) = command
        .data
        .options
        .iter()
        .find(|o| o.name == "horse")
        .and_then(|o| o.value.as_str())
    else {
        let builder = notice("❌ Missing Horse", "Usage: `/energy [horse name]`", 0xFF0000);
        return command.create_response(&ctx.http, builder).await;
    };

    let guild_id = command.guild_id.unwrap_or_default().to_string();
    let user_id = command.user.id.to_string();

    let horse = match find_horse_by_name(&bot.database, &guild_id, &user_id, name).await {
        Ok(Some(horse)) => horse,
        Ok(None) | Err(HorserError::InvalidName { .. }) => {
            let builder = notice(
                "❓ No Such Horse",
                format!("There is no horse called **{}** in your stable.", escape_markdown(name.trim())),
                0xAAAAAA,
            );
            return command.create_response(&ctx.http, builder).await;
        }
        Err(why) => {
            error!("Error looking up horse '{}': {:?}", name, why);
            return command
                .create_response(&ctx.http, database_error("Couldn't find the stable records."))
                .await;
        }
    };

    let builder = match horse_energy(&bot.database, &bot.config.regen, horse.horse_id, unix_now()).await {
        Ok((energy, max_energy)) => {
            let status = if energy >= max_energy {
                "Fully rested and ready to run!"
            } else {
                "Resting in the stable."
            };
            notice(
                "⚡ Energy",
                format!(
                    "**{}** has **{}/{}** energy.\n\n{}",
                    escape_markdown(&horse.horse_name),
                    energy,
                    max_energy,
                    status
                ),
                0xC27C0E,
            )
        }
        Err(why) => {
            error!("Error reading energy for horse {}: {:?}", horse.horse_id, why);
            database_error("The energy meter is broken. Try again in a moment.")
        }
    };
    command.create_response(&ctx.http, builder).await
}
