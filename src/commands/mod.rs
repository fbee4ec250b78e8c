pub mod buyhorse;
pub mod energy;
pub mod help;
pub mod horser;

// Re-export all command handlers
pub use buyhorse::handle_buyhorse_command;
pub use energy::handle_energy_command;
pub use help::handle_help_command;
pub use horser::{handle_horser_command, handle_menu_button};

use serenity::all::{CreateEmbed, CreateInteractionResponse, CreateInteractionResponseMessage};

/// Ephemeral one-embed reply used for validation and storage failures.
pub fn notice(title: &str, description: impl Into<String>, color: u32) -> CreateInteractionResponse {
    CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .add_embed(
                CreateEmbed::new()
                    .title(title)
                    .description(description)
                    .color(color),
            )
            .ephemeral(true),
    )
}

pub fn database_error(description: &str) -> CreateInteractionResponse {
    notice("⚠️ Database Error", description, 0xFF0000)
}
