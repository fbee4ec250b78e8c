use super::{database_error, notice};
use crate::Bot;
use crate::error::HorserError;
use crate::horse::{HorseColor, Purchase, buy_horse};
use crate::time::unix_now;
use crate::utils::{escape_markdown, humanize_number};
use log::error;
use serenity::all::{
    CommandInteraction, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use serenity::prelude::*;

pub async fn handle_buyhorse_command(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &Bot,
) -> Result<(), serenity::Error> {
    let option = |name: &str| {
        command
            .data
            .options
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.value.as_str())
    };

    let (Some(color), Some(name)) = (option("color"), option("name")) else {
        let builder = notice(
            "❌ Missing Details",
            "Usage: `/buyhorse [color] [name]`",
            0xFF0000,
        );
        return command.create_response(&ctx.http, builder).await;
    };

    let currency = &bot.config.currency_name;
    let price = bot.config.horse_price;

    let color = match color.parse::<HorseColor>() {
        Ok(color) => color,
        Err(_) => {
            let builder = notice(
                "❌ Invalid Color",
                format!("Valid colors are: {}", HorseColor::valid_list()),
                0xFF0000,
            );
            return command.create_response(&ctx.http, builder).await;
        }
    };

    let guild_id = command.guild_id.unwrap_or_default().to_string();
    let user_id = command.user.id.to_string();
    let purchase = Purchase {
        guild_id: &guild_id,
        user_id: &user_id,
        color,
        name,
        price,
        starting_balance: bot.config.starting_balance,
    };

    let horse = match buy_horse(&bot.database, &purchase, unix_now()).await {
        Ok(horse) => horse,
        Err(HorserError::InsufficientFunds { balance, price }) => {
            let builder = notice(
                "💸 Not Enough Money",
                format!(
                    "You do not have enough {} to buy a horse. You need {} {} but only have {}.",
                    currency,
                    humanize_number(price),
                    currency,
                    humanize_number(balance)
                ),
                0xFF5733,
            );
            return command.create_response(&ctx.http, builder).await;
        }
        Err(why @ HorserError::InvalidName { .. }) => {
            let builder = notice("❌ Invalid Name", format!("{}.", capitalize(&why.to_string())), 0xFF0000);
            return command.create_response(&ctx.http, builder).await;
        }
        Err(why) => {
            error!("Error buying horse for {}: {:?}", user_id, why);
            let builder = database_error("The horse dealer's ledger caught fire. No money was taken.");
            return command.create_response(&ctx.http, builder).await;
        }
    };

    let builder = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new().add_embed(
            CreateEmbed::new()
                .title("🐎 New Horse!")
                .description(format!(
                    "{} You have successfully bought a {} horse named **{}** for {} {}!",
                    bot.config.emojis.get(color),
                    color,
                    escape_markdown(&horse.horse_name),
                    humanize_number(price),
                    currency
                ))
                .color(0x1F8B4C)
                .footer(CreateEmbedFooter::new("Find your new horse in /horser → Stable.")),
        ),
    );
    command.create_response(&ctx.http, builder).await
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
