use crate::Bot;
use crate::time::format_countdown;
use crate::utils::humanize_number;
use serenity::all::{
    CommandInteraction, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use serenity::prelude::*;

pub async fn handle_help_command(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &Bot,
) -> Result<(), serenity::Error> {
    let regen = bot.config.regen;
    let builder = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .add_embed(
                CreateEmbed::new()
                    .title("🐎 Horser Help Guide 🐎")
                    .description(
                        "Welcome to Horser, the horse racing simulation game! Below you'll find information about all the available commands:"
                    )
                    .color(0xAD1457)
                    .field(
                        "/horser",
                        "Opens the main menu. From there you can visit your stable, the store and the race track.",
                        false
                    )
                    .field(
                        "/buyhorse",
                        format!(
                            "Buy a horse of the given color and name for {} {}.",
                            humanize_number(bot.config.horse_price),
                            bot.config.currency_name
                        ),
                        false
                    )
                    .field(
                        "/energy",
                        "Check a horse's current energy.",
                        false
                    )
                    .field(
                        "Energy",
                        format!(
                            "Horses regain {} energy every {}, even while the bot is offline.",
                            regen.regen_per_tick,
                            format_countdown(regen.tick_seconds)
                        ),
                        false
                    )
                    .footer(CreateEmbedFooter::new("May your horses run fast and true!")),
            )
            .ephemeral(true),
    );
    command.create_response(&ctx.http, builder).await
}
