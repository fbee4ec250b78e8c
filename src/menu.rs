//! The `/horser` panel as a finite-state machine.
//!
//! Buttons carry the state they were rendered in, the action they trigger and
//! the user who opened the panel, so each click is handled without any
//! server-side session.

use crate::config::HorseEmojis;
use crate::energy::RegenPolicy;
use crate::horse::{Horse, HorseColor};
use crate::time::format_countdown;
use crate::utils::{escape_markdown, humanize_number};

const CUSTOM_ID_PREFIX: &str = "horser";
// Discord rejects embeds with more fields than this.
const MAX_EMBED_FIELDS: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Main,
    Stable,
    Store,
    StoreBuyHorse,
    Race,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Stable,
    Store,
    Race,
    BuyHorse,
    Back,
}

impl MenuState {
    pub fn transition(self, action: MenuAction) -> Option<MenuState> {
        use MenuAction as A;
        use MenuState as S;
        match (self, action) {
            (S::Main, A::Stable) => Some(S::Stable),
            (S::Main, A::Store) => Some(S::Store),
            (S::Main, A::Race) => Some(S::Race),
            (S::Store, A::BuyHorse) => Some(S::StoreBuyHorse),
            (S::Stable | S::Store | S::Race, A::Back) => Some(S::Main),
            (S::StoreBuyHorse, A::Back) => Some(S::Store),
            _ => None,
        }
    }

    /// Buttons shown in this state, in display order.
    pub fn actions(self) -> &'static [MenuAction] {
        match self {
            MenuState::Main => &[MenuAction::Stable, MenuAction::Store, MenuAction::Race],
            MenuState::Store => &[MenuAction::BuyHorse, MenuAction::Back],
            MenuState::Stable | MenuState::StoreBuyHorse | MenuState::Race => &[MenuAction::Back],
        }
    }

    fn key(self) -> &'static str {
        match self {
            MenuState::Main => "main",
            MenuState::Stable => "stable",
            MenuState::Store => "store",
            MenuState::StoreBuyHorse => "buy",
            MenuState::Race => "race",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "main" => MenuState::Main,
            "stable" => MenuState::Stable,
            "store" => MenuState::Store,
            "buy" => MenuState::StoreBuyHorse,
            "race" => MenuState::Race,
            _ => return None,
        })
    }
}

impl MenuAction {
    pub fn label(self) -> &'static str {
        match self {
            MenuAction::Stable => "Stable",
            MenuAction::Store => "Store",
            MenuAction::Race => "Race!",
            MenuAction::BuyHorse => "Buy Horse",
            MenuAction::Back => "Back",
        }
    }

    pub fn is_primary(self) -> bool {
        matches!(self, MenuAction::Race | MenuAction::BuyHorse)
    }

    fn key(self) -> &'static str {
        match self {
            MenuAction::Stable => "stable",
            MenuAction::Store => "store",
            MenuAction::Race => "race",
            MenuAction::BuyHorse => "buy",
            MenuAction::Back => "back",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "stable" => MenuAction::Stable,
            "store" => MenuAction::Store,
            "race" => MenuAction::Race,
            "buy" => MenuAction::BuyHorse,
            "back" => MenuAction::Back,
            _ => return None,
        })
    }
}

/// Decoded `horser:<state>:<action>:<owner>` button id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonId {
    pub state: MenuState,
    pub action: MenuAction,
    pub owner: u64,
}

impl ButtonId {
    pub fn encode(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            CUSTOM_ID_PREFIX,
            self.state.key(),
            self.action.key(),
            self.owner
        )
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let mut parts = custom_id.split(':');
        if parts.next()? != CUSTOM_ID_PREFIX {
            return None;
        }
        let state = MenuState::from_key(parts.next()?)?;
        let action = MenuAction::from_key(parts.next()?)?;
        let owner = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            state,
            action,
            owner,
        })
    }

    pub fn is_menu_button(custom_id: &str) -> bool {
        custom_id
            .strip_prefix(CUSTOM_ID_PREFIX)
            .is_some_and(|rest| rest.starts_with(':'))
    }
}

/// Everything a panel may need to render, loaded by the caller.
pub struct MenuSnapshot<'a> {
    pub owner: u64,
    pub horses: &'a [Horse],
    pub balance: i64,
    pub currency_name: &'a str,
    pub horse_price: i64,
    pub emojis: &'a HorseEmojis,
    pub regen: RegenPolicy,
    pub now: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuButton {
    pub label: &'static str,
    pub custom_id: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuView {
    pub title: &'static str,
    pub color: u32,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub buttons: Vec<MenuButton>,
}

pub fn render(state: MenuState, snapshot: &MenuSnapshot<'_>) -> MenuView {
    let balance = humanize_number(snapshot.balance);
    let currency = snapshot.currency_name;
    let mut fields = Vec::new();

    let (title, color, description) = match state {
        MenuState::Main => (
            "Horser",
            0xAD1457,
            format!(
                "Welcome to Horser! The horse racing simulation game.\n\n<@{}>, you have {} in your stable.",
                snapshot.owner,
                horse_count(snapshot.horses.len())
            ),
        ),
        MenuState::Stable => {
            for (idx, horse) in snapshot.horses.iter().take(MAX_EMBED_FIELDS).enumerate() {
                fields.push(stable_entry(idx + 1, horse, snapshot));
            }
            let mut description = format!(
                "You currently have {} in your stable.",
                horse_count(snapshot.horses.len())
            );
            let hidden = snapshot.horses.len().saturating_sub(MAX_EMBED_FIELDS);
            if hidden > 0 {
                description.push_str(&format!("\n…and {} more.", hidden));
            }
            ("Stable", 0xC27C0E, description)
        }
        MenuState::Store => (
            "Store",
            0x1F8B4C,
            format!(
                "Here you can buy horses and training equipment.\n\nYour current balance is {} {}.\n\nTraining equipment is coming soon.",
                balance, currency
            ),
        ),
        MenuState::StoreBuyHorse => {
            let grid = HorseColor::ALL
                .chunks(4)
                .map(|row| {
                    row.iter()
                        .map(|color| snapshot.emojis.get(*color))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join("\n");
            (
                "Buy Horse",
                0x1F8B4C,
                format!(
                    "Your current balance is {} {}.\n\nTo buy a horse, use `/buyhorse [color] [name]`. A horse costs {} {}.\n\nThere are currently {} colors available: {}.\n\n{}",
                    balance,
                    currency,
                    humanize_number(snapshot.horse_price),
                    currency,
                    HorseColor::ALL.len(),
                    HorseColor::valid_list(),
                    grid
                ),
            )
        }
        MenuState::Race => (
            "Race!",
            0x2ECC71,
            "Race your horses for cash!\n\nRacing is coming soon.".to_string(),
        ),
    };

    let buttons = state
        .actions()
        .iter()
        .map(|action| MenuButton {
            label: action.label(),
            custom_id: ButtonId {
                state,
                action: *action,
                owner: snapshot.owner,
            }
            .encode(),
            primary: action.is_primary(),
        })
        .collect();

    MenuView {
        title,
        color,
        description,
        fields,
        buttons,
    }
}

fn horse_count(n: usize) -> String {
    if n == 1 {
        "1 horse".to_string()
    } else {
        format!("{} horses", n)
    }
}

fn stable_entry(position: usize, horse: &Horse, snapshot: &MenuSnapshot<'_>) -> (String, String) {
    let emoji = horse
        .color()
        .map(|color| snapshot.emojis.get(color))
        .unwrap_or("🐎");

    let mut energy = format!("Energy: **{}/{}**", horse.energy, horse.max_energy);
    if horse.energy < horse.max_energy {
        let wait = snapshot.regen.next_tick_in(horse.last_regen_ts, snapshot.now);
        energy.push_str(&format!(
            " (+{} in {})",
            snapshot.regen.regen_per_tick,
            format_countdown(wait)
        ));
    }

    (
        format!("{}. {} {}", position, emoji, escape_markdown(&horse.horse_name)),
        format!(
            "{}\nSPD {} · POW {} · STA {} · GUT {} · WIT {}\nRaces: {} run, {} won",
            energy,
            horse.speed,
            horse.power,
            horse.stamina,
            horse.guts,
            horse.wit,
            horse.races_run,
            horse.races_won
        ),
    )
}
