use super::{database_error, notice};
use crate::Bot;
use crate::energy::catch_up_owner;
use crate::horse::list_horses;
use crate::ledger;
use crate::menu::{ButtonId, MenuSnapshot, MenuState, MenuView, render};
use crate::time::unix_now;
use log::{error, info};
use serenity::all::{
    ButtonStyle, CommandInteraction, ComponentInteraction, CreateActionRow, CreateButton,
    CreateEmbed, CreateEmbedFooter, CreateInteractionResponse, CreateInteractionResponseMessage,
    User,
};
use serenity::prelude::*;

// Stable energy is caught up before rendering so the panel never shows stale values.
async fn load_view(
    bot: &Bot,
    state: MenuState,
    guild_id: &str,
    user: &User,
) -> Result<MenuView, sqlx::Error> {
    let now = unix_now();
    let user_id = user.id.to_string();

    catch_up_owner(&bot.database, &bot.config.regen, guild_id, &user_id, now).await?;
    let horses = list_horses(&bot.database, guild_id, &user_id).await?;
    let balance = {
        let mut conn = bot.database.acquire().await?;
        ledger::balance(&mut conn, guild_id, &user_id, bot.config.starting_balance).await?
    };

    Ok(render(
        state,
        &MenuSnapshot {
            owner: user.id.get(),
            horses: &horses,
            balance,
            currency_name: &bot.config.currency_name,
            horse_price: bot.config.horse_price,
            emojis: &bot.config.emojis,
            regen: bot.config.regen,
            now,
        },
    ))
}

fn to_message(view: MenuView, user: &User) -> CreateInteractionResponseMessage {
    let mut embed = CreateEmbed::new()
        .title(view.title)
        .description(view.description)
        .color(view.color)
        .footer(CreateEmbedFooter::new(user.display_name()).icon_url(user.face()));
    for (name, value) in view.fields {
        embed = embed.field(name, value, false);
    }

    let buttons = view
        .buttons
        .into_iter()
        .map(|button| {
            CreateButton::new(button.custom_id)
                .label(button.label)
                .style(if button.primary {
                    ButtonStyle::Primary
                } else {
                    ButtonStyle::Secondary
                })
        })
        .collect();

    CreateInteractionResponseMessage::new()
        .add_embed(embed)
        .components(vec![CreateActionRow::Buttons(buttons)])
}

pub async fn handle_horser_command(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &Bot,
) -> Result<(), serenity::Error> {
    let guild_id = command.guild_id.unwrap_or_default().to_string();

    let builder = match load_view(bot, MenuState::Main, &guild_id, &command.user).await {
        Ok(view) => CreateInteractionResponse::Message(to_message(view, &command.user)),
        Err(why) => {
            error!("Error loading main menu: {:?}", why);
            database_error("Couldn't open the stable doors. Try again in a moment.")
        }
    };
    command.create_response(&ctx.http, builder).await
}

pub async fn handle_menu_button(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &Bot,
) -> Result<(), serenity::Error> {
    let Some(id) = ButtonId::parse(&component.data.custom_id) else {
        let builder = notice(
            "❓ Unknown Button",
            "This menu is out of date. Use /horser to open a fresh one.",
            0xAAAAAA,
        );
        return component.create_response(&ctx.http, builder).await;
    };

    if id.owner != component.user.id.get() {
        let builder = notice(
            "🐴 Not Your Stable",
            "This menu belongs to someone else. Use /horser to open your own.",
            0xFF9900,
        );
        return component.create_response(&ctx.http, builder).await;
    }

    let Some(next) = id.state.transition(id.action) else {
        info!(
            "Rejected menu transition {:?} -> {:?} by {}",
            id.state, id.action, component.user.id
        );
        let builder = notice(
            "❓ Unknown Button",
            "This menu is out of date. Use /horser to open a fresh one.",
            0xAAAAAA,
        );
        return component.create_response(&ctx.http, builder).await;
    };

    let guild_id = component.guild_id.unwrap_or_default().to_string();
    let builder = match load_view(bot, next, &guild_id, &component.user).await {
        Ok(view) => CreateInteractionResponse::UpdateMessage(to_message(view, &component.user)),
        Err(why) => {
            error!("Error loading {:?} menu: {:?}", next, why);
            database_error("The stable hands lost your paperwork. Try again in a moment.")
        }
    };
    component.create_response(&ctx.http, builder).await
}
