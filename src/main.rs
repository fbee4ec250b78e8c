use commands::*;
use config::Config;
use fern::colors::{Color, ColoredLevelConfig};
use horse::{HorseColor, MAX_NAME_LENGTH};
use log::{LevelFilter, error, info};
use menu::ButtonId;
use presence::update_presence;
use serenity::all::{
    CreateCommand, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};
use serenity::async_trait;
use serenity::builder::CreateCommandOption;
use serenity::model::application::{CommandOptionType, Interaction};
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;
use tokio::time::Instant;
mod commands;
mod config;
mod energy;
mod error;
mod horse;
mod ledger;
mod menu;
mod presence;
mod time;
mod utils;

struct Handler;

impl TypeMapKey for Bot {
    type Value = Arc<Bot>;
}

pub struct Bot {
    pub database: Pool<Sqlite>,
    pub config: Config,
    presence_started: AtomicBool,
}

impl Bot {
    fn new(database: Pool<Sqlite>, config: Config) -> Self {
        Self {
            database,
            config,
            presence_started: AtomicBool::new(false),
        }
    }

    /// True only for the first caller; `ready` fires again on every reconnect.
    fn claim_presence_loop(&self) -> bool {
        !self.presence_started.swap(true, Ordering::SeqCst)
    }
}

async fn shared_bot(ctx: &Context) -> Option<Arc<Bot>> {
    let bot = ctx.data.read().await.get::<Bot>().cloned();
    if bot.is_none() {
        error!("Bot data missing from the client type map");
    }
    bot
}

#[async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if command.guild_id.is_none() {
                    info!(
                        "Command invoked in DM: /{} by {} (ID: {})",
                        command.data.name, command.user.name, command.user.id
                    );
                    if let Err(why) = command.create_response(&ctx.http,
                        CreateInteractionResponse::Message(
                            CreateInteractionResponseMessage::new()
                            .add_embed(
                                CreateEmbed::new()
                                .title("⚠️ Server Only Bot")
                                .description("Horser can only be used in a server, not in direct messages.")
                                .color(0xFF5733)
                                .footer(CreateEmbedFooter::new(
                                    "Your stable lives in a server. Saddle up there!",
                                ))
                            )
                            .ephemeral(true)
                        )
                    ).await {
                        error!("Cannot respond to slash command for guild check: {}", why);
                    }
                    return;
                }

                info!(
                    "Command invoked: /{} by {} (ID: {}) in guild {}",
                    command.data.name,
                    command.user.name,
                    command.user.id,
                    command.guild_id.unwrap_or_default()
                );

                let Some(bot) = shared_bot(&ctx).await else {
                    return;
                };

                let now = Instant::now();
                let result = match command.data.name.as_str() {
                    "horser" => handle_horser_command(&ctx, &command, &bot).await,
                    "buyhorse" => handle_buyhorse_command(&ctx, &command, &bot).await,
                    "energy" => handle_energy_command(&ctx, &command, &bot).await,
                    "horserhelp" => handle_help_command(&ctx, &command, &bot).await,
                    _ => {
                        command
                            .create_response(
                                &ctx.http,
                                CreateInteractionResponse::Message(
                                    CreateInteractionResponseMessage::new()
                                        .content("Not implemented")
                                        .ephemeral(true),
                                ),
                            )
                            .await
                    }
                };

                if let Err(why) = result {
                    error!("Error executing command {}: {}", command.data.name, why);
                }

                info!(
                    "Command /{} executed in {} ms",
                    command.data.name,
                    now.elapsed().as_millis()
                );
            }
            Interaction::Component(component) => {
                if !ButtonId::is_menu_button(&component.data.custom_id) {
                    return;
                }
                info!("Component interaction: {}", component.data.custom_id);

                let Some(bot) = shared_bot(&ctx).await else {
                    return;
                };

                if let Err(why) = handle_menu_button(&ctx, &component, &bot).await {
                    error!("Error handling menu button: {}", why);
                }
            }
            _ => {}
        }
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        // Start a task to periodically update the presence
        if let Some(bot) = shared_bot(&ctx).await.filter(|bot| bot.claim_presence_loop()) {
            let ctx_clone = ctx.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(StdDuration::from_secs(300)); // Update every 5 minutes

                loop {
                    interval.tick().await;
                    update_presence(&ctx_clone, &bot).await;
                }
            });
        }

        let color_option = HorseColor::ALL.iter().fold(
            CreateCommandOption::new(CommandOptionType::String, "color", "Coat color of your new horse")
                .required(true),
            |option, color| option.add_string_choice(color.as_str(), color.as_str()),
        );

        let commands = vec![
            CreateCommand::new("horser").description("Open the Horser main menu"),
            CreateCommand::new("buyhorse")
                .description("Buy a new horse for your stable")
                .add_option(color_option)
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "name",
                        "What your horse will be called",
                    )
                    .required(true)
                    .max_length(MAX_NAME_LENGTH as u16),
                ),
            CreateCommand::new("energy")
                .description("Check how rested one of your horses is")
                .add_option(
                    CreateCommandOption::new(
                        CommandOptionType::String,
                        "horse",
                        "Name of the horse",
                    )
                    .required(true),
                ),
            CreateCommand::new("horserhelp").description("Show help information about Horser"),
        ];

        if let Err(why) = ctx.http.create_global_commands(&commands).await {
            error!("Error creating global commands: {}", why);
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logger
    let colors_line = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::BrightCyan)
        .trace(Color::BrightBlack);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors_line.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_PKG_NAME"), LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()
        .expect("Failed to initialize logger");

    // Load environment variables
    dotenv::dotenv().ok();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(why) => {
            error!("Invalid configuration: {}", why);
            return;
        }
    };

    // Connect to the database using a connection pool
    let database = SqlitePool::connect(&config.database_url)
        .await
        .expect("Couldn't connect to the sqlite database");

    sqlx::migrate!()
        .run(&database)
        .await
        .expect("Couldn't run database migrations");

    // Regeneration only needs the database, so it runs independently of the gateway.
    energy::spawn_regenerator(database.clone(), config.regen, config.regen_check_every);

    let intents = GatewayIntents::GUILDS;
    let token = config.discord_token.clone();

    let bot_data = Arc::new(Bot::new(database, config));

    let mut client = Client::builder(token, intents)
        .event_handler(Handler)
        .await
        .expect("Error creating client");

    {
        let mut data = client.data.write().await;
        data.insert::<Bot>(bot_data);
    }

    // Start the bot
    if let Err(why) = client.start().await {
        error!("An error occurred while running the client: {:?}", why);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn presence_loop_is_claimed_once() {
        let config = Config::from_lookup(|key| match key {
            "DISCORD_TOKEN" | "DATABASE_URL" => Some("x".to_string()),
            _ => None,
        })
        .unwrap();
        let database = SqlitePool::connect_lazy("sqlite::memory:").unwrap();
        let bot = Bot::new(database, config);

        assert!(bot.claim_presence_loop());
        assert!(!bot.claim_presence_loop());
        assert!(!bot.claim_presence_loop());
    }
}
