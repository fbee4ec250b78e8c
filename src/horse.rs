use crate::error::HorserError;
use crate::ledger;
use log::info;
use sqlx::{FromRow, SqlitePool};
use std::fmt;
use std::str::FromStr;

pub const MAX_NAME_LENGTH: usize = 32;

/// Coat colors a horse can be bought in. Each has a matching application emoji.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HorseColor {
    Aqua,
    Ash,
    Black,
    Blue,
    Brown,
    Chocolate,
    Cream,
    Diamond,
    Green,
    Grey,
    Lime,
    Orange,
    Pink,
    Purple,
    Red,
    Sky,
    Soot,
    White,
    Yellow,
    Zombie,
}

impl HorseColor {
    pub const ALL: [HorseColor; 20] = [
        HorseColor::Aqua,
        HorseColor::Ash,
        HorseColor::Black,
        HorseColor::Blue,
        HorseColor::Brown,
        HorseColor::Chocolate,
        HorseColor::Cream,
        HorseColor::Diamond,
        HorseColor::Green,
        HorseColor::Grey,
        HorseColor::Lime,
        HorseColor::Orange,
        HorseColor::Pink,
        HorseColor::Purple,
        HorseColor::Red,
        HorseColor::Sky,
        HorseColor::Soot,
        HorseColor::White,
        HorseColor::Yellow,
        HorseColor::Zombie,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            HorseColor::Aqua => "aqua",
            HorseColor::Ash => "ash",
            HorseColor::Black => "black",
            HorseColor::Blue => "blue",
            HorseColor::Brown => "brown",
            HorseColor::Chocolate => "chocolate",
            HorseColor::Cream => "cream",
            HorseColor::Diamond => "diamond",
            HorseColor::Green => "green",
            HorseColor::Grey => "grey",
            HorseColor::Lime => "lime",
            HorseColor::Orange => "orange",
            HorseColor::Pink => "pink",
            HorseColor::Purple => "purple",
            HorseColor::Red => "red",
            HorseColor::Sky => "sky",
            HorseColor::Soot => "soot",
            HorseColor::White => "white",
            HorseColor::Yellow => "yellow",
            HorseColor::Zombie => "zombie",
        }
    }

    /// Comma separated list of every color, for error messages.
    pub fn valid_list() -> String {
        Self::ALL
            .iter()
            .map(|color| color.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for HorseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HorseColor {
    type Err = HorserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == wanted)
            .ok_or_else(|| HorserError::InvalidColor(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Horse {
    pub horse_id: i64,
    pub guild_id: String,
    pub user_id: String,
    pub horse_name: String,
    pub horse_color: String,
    pub speed: i64,
    pub power: i64,
    pub stamina: i64,
    pub guts: i64,
    pub wit: i64,
    pub energy: i64,
    pub max_energy: i64,
    pub last_regen_ts: i64,
    pub races_run: i64,
    pub races_won: i64,
}

impl Horse {
    /// Stored colors are always written through `HorseColor`, so a parse
    /// failure only happens if the row was edited by hand.
    pub fn color(&self) -> Option<HorseColor> {
        self.horse_color.parse().ok()
    }
}

/// Capitalizes every word and collapses whitespace: "  sea   BISCUIT" -> "Sea Biscuit".
pub fn normalize_name(raw: &str) -> Result<String, HorserError> {
    let name = raw
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LENGTH {
        return Err(HorserError::InvalidName {
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(name)
}

pub struct Purchase<'a> {
    pub guild_id: &'a str,
    pub user_id: &'a str,
    pub color: HorseColor,
    pub name: &'a str,
    pub price: i64,
    pub starting_balance: i64,
}

/// Debits the owner and stables a new horse in one transaction.
///
/// Nothing is written when the owner cannot afford the horse: the transaction
/// is dropped before commit and rolls back the account it may have opened.
pub async fn buy_horse(
    db: &SqlitePool,
    purchase: &Purchase<'_>,
    now: i64,
) -> Result<Horse, HorserError> {
    let name = normalize_name(purchase.name)?;

    let mut tx = db.begin().await?;

    let debited = ledger::debit(
        &mut tx,
        purchase.guild_id,
        purchase.user_id,
        purchase.price,
        purchase.starting_balance,
    )
    .await?;
    if !debited {
        let balance = ledger::balance(
            &mut tx,
            purchase.guild_id,
            purchase.user_id,
            purchase.starting_balance,
        )
        .await?;
        return Err(HorserError::InsufficientFunds {
            balance,
            price: purchase.price,
        });
    }

    let horse = sqlx::query_as::<_, Horse>(
        "INSERT INTO horses (guild_id, user_id, horse_name, horse_color, last_regen_ts)
         VALUES (?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(purchase.guild_id)
    .bind(purchase.user_id)
    .bind(&name)
    .bind(purchase.color.as_str())
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "User {} in guild {} bought horse #{} '{}' ({})",
        horse.user_id, horse.guild_id, horse.horse_id, horse.horse_name, horse.horse_color
    );
    Ok(horse)
}

pub async fn list_horses(
    db: &SqlitePool,
    guild_id: &str,
    user_id: &str,
) -> Result<Vec<Horse>, sqlx::Error> {
    sqlx::query_as::<_, Horse>(
        "SELECT * FROM horses WHERE guild_id = ? AND user_id = ? ORDER BY horse_id",
    )
    .bind(guild_id)
    .bind(user_id)
    .fetch_all(db)
    .await
}

/// First horse in the owner's stable with this name, matched after normalization.
pub async fn find_horse_by_name(
    db: &SqlitePool,
    guild_id: &str,
    user_id: &str,
    name: &str,
) -> Result<Option<Horse>, HorserError> {
    let name = normalize_name(name)?;
    Ok(sqlx::query_as::<_, Horse>(
        "SELECT * FROM horses WHERE guild_id = ? AND user_id = ? AND horse_name = ?
         ORDER BY horse_id LIMIT 1",
    )
    .bind(guild_id)
    .bind(user_id)
    .bind(name)
    .fetch_optional(db)
    .await?)
}

pub async fn total_horses(db: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM horses")
        .fetch_one(db)
        .await
}
