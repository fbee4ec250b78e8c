use crate::energy::RegenPolicy;
use crate::horse::HorseColor;
use std::env;
use std::time::Duration as StdDuration;
use thiserror::Error;

const DEFAULT_EMOJI: &str = "🐎";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("{key} must be a positive integer, got `{value}`")]
    NotPositive { key: &'static str, value: String },
    #[error("HORSER_REGEN_CHECK_SECONDS ({check}s) must not exceed HORSER_TICK_SECONDS ({tick}s)")]
    CheckSlowerThanTick { check: u64, tick: i64 },
}

/// Application emoji reference for every horse color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HorseEmojis {
    pub aqua: String,
    pub ash: String,
    pub black: String,
    pub blue: String,
    pub brown: String,
    pub chocolate: String,
    pub cream: String,
    pub diamond: String,
    pub green: String,
    pub grey: String,
    pub lime: String,
    pub orange: String,
    pub pink: String,
    pub purple: String,
    pub red: String,
    pub sky: String,
    pub soot: String,
    pub white: String,
    pub yellow: String,
    pub zombie: String,
}

impl HorseEmojis {
    pub fn get(&self, color: HorseColor) -> &str {
        match color {
            HorseColor::Aqua => &self.aqua,
            HorseColor::Ash => &self.ash,
            HorseColor::Black => &self.black,
            HorseColor::Blue => &self.blue,
            HorseColor::Brown => &self.brown,
            HorseColor::Chocolate => &self.chocolate,
            HorseColor::Cream => &self.cream,
            HorseColor::Diamond => &self.diamond,
            HorseColor::Green => &self.green,
            HorseColor::Grey => &self.grey,
            HorseColor::Lime => &self.lime,
            HorseColor::Orange => &self.orange,
            HorseColor::Pink => &self.pink,
            HorseColor::Purple => &self.purple,
            HorseColor::Red => &self.red,
            HorseColor::Sky => &self.sky,
            HorseColor::Soot => &self.soot,
            HorseColor::White => &self.white,
            HorseColor::Yellow => &self.yellow,
            HorseColor::Zombie => &self.zombie,
        }
    }

    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let emoji = |color: &str| {
            lookup(&format!("HORSER_EMOJI_{}", color.to_uppercase()))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| DEFAULT_EMOJI.to_string())
        };
        Self {
            aqua: emoji("aqua"),
            ash: emoji("ash"),
            black: emoji("black"),
            blue: emoji("blue"),
            brown: emoji("brown"),
            chocolate: emoji("chocolate"),
            cream: emoji("cream"),
            diamond: emoji("diamond"),
            green: emoji("green"),
            grey: emoji("grey"),
            lime: emoji("lime"),
            orange: emoji("orange"),
            pink: emoji("pink"),
            purple: emoji("purple"),
            red: emoji("red"),
            sky: emoji("sky"),
            soot: emoji("soot"),
            white: emoji("white"),
            yellow: emoji("yellow"),
            zombie: emoji("zombie"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub regen: RegenPolicy,
    pub regen_check_every: StdDuration,
    pub horse_price: i64,
    pub starting_balance: i64,
    pub currency_name: String,
    pub emojis: HorseEmojis,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let positive = |key: &'static str, default: i64| match lookup(key) {
            None => Ok(default),
            Some(value) => match value.trim().parse::<i64>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(ConfigError::NotPositive { key, value }),
            },
        };

        let regen = RegenPolicy {
            tick_seconds: positive("HORSER_TICK_SECONDS", 300)?,
            regen_per_tick: positive("HORSER_REGEN_PER_TICK", 1)?,
        };
        let check = positive("HORSER_REGEN_CHECK_SECONDS", 60)? as u64;
        if check as i64 > regen.tick_seconds {
            return Err(ConfigError::CheckSlowerThanTick {
                check,
                tick: regen.tick_seconds,
            });
        }

        Ok(Self {
            discord_token: required("DISCORD_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            regen,
            regen_check_every: StdDuration::from_secs(check),
            horse_price: positive("HORSER_HORSE_PRICE", 25_000)?,
            starting_balance: positive("HORSER_STARTING_BALANCE", 50_000)?,
            currency_name: lookup("HORSER_CURRENCY_NAME")
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| "credits".to_string()),
            emojis: HorseEmojis::load(&lookup),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    const BASE: [(&str, &str); 2] = [("DISCORD_TOKEN", "token"), ("DATABASE_URL", "sqlite::memory:")];

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let config = config_from(&BASE).unwrap();

        assert_eq!(config.regen, RegenPolicy::default());
        assert_eq!(config.regen_check_every, StdDuration::from_secs(60));
        assert_eq!(config.horse_price, 25_000);
        assert_eq!(config.starting_balance, 50_000);
        assert_eq!(config.currency_name, "credits");
        assert_eq!(config.emojis.get(HorseColor::Zombie), DEFAULT_EMOJI);
    }

    #[test]
    fn emojis_are_read_per_color() {
        let mut pairs = BASE.to_vec();
        pairs.push(("HORSER_EMOJI_AQUA", "<:horse_aqua:1234>"));
        pairs.push(("HORSER_EMOJI_ASH", "   "));
        let config = config_from(&pairs).unwrap();

        assert_eq!(config.emojis.get(HorseColor::Aqua), "<:horse_aqua:1234>");
        assert_eq!(config.emojis.get(HorseColor::Ash), DEFAULT_EMOJI);
    }

    #[test]
    fn missing_token_is_reported() {
        assert_eq!(
            config_from(&[("DATABASE_URL", "x")]).unwrap_err(),
            ConfigError::Missing("DISCORD_TOKEN")
        );
    }

    #[test]
    fn numbers_must_be_positive() {
        let mut pairs = BASE.to_vec();
        pairs.push(("HORSER_TICK_SECONDS", "0"));
        assert!(matches!(
            config_from(&pairs),
            Err(ConfigError::NotPositive { key: "HORSER_TICK_SECONDS", .. })
        ));

        let mut pairs = BASE.to_vec();
        pairs.push(("HORSER_HORSE_PRICE", "lots"));
        assert!(config_from(&pairs).is_err());
    }

    #[test]
    fn check_cadence_cannot_exceed_a_tick() {
        let mut pairs = BASE.to_vec();
        pairs.push(("HORSER_TICK_SECONDS", "30"));
        assert_eq!(
            config_from(&pairs).unwrap_err(),
            ConfigError::CheckSlowerThanTick { check: 60, tick: 30 }
        );
    }
}
