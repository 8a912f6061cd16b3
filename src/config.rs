//! Runtime configuration, read from the environment (and `.env` if present).

use crate::database::StoreConfig;
use chrono::Duration;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::time::Duration as StdDuration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Knobs of the economy itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomySettings {
    /// Shown in the `join` reply.
    pub name: String,
    pub starting_balance: i64,
    pub work_cooldown: Duration,
}

impl Default for EconomySettings {
    fn default() -> Self {
        Self {
            name: "beamconomy".to_string(),
            starting_balance: 1000,
            work_cooldown: Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    /// When set, the bot only answers in this guild and registers guild commands.
    pub guild_id: Option<NonZeroU64>,
    /// The only user allowed to run `/ledger`.
    pub owner_id: Option<NonZeroU64>,
    pub prefix: String,
    pub store: StoreConfig,
    pub economy: EconomySettings,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; real deployments set variables directly.
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let defaults = EconomySettings::default();
        let starting_balance: i64 =
            parse_or(&lookup, "STARTING_BALANCE", defaults.starting_balance)?;
        if starting_balance < 0 {
            return Err(invalid("STARTING_BALANCE", starting_balance));
        }
        let cooldown_hours: i64 = parse_or(&lookup, "WORK_COOLDOWN_HOURS", 24)?;
        if !(1..=24 * 365).contains(&cooldown_hours) {
            return Err(invalid("WORK_COOLDOWN_HOURS", cooldown_hours));
        }

        let url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://bot.db".to_string());
        let max_connections: u32 = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?;
        if max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", max_connections));
        }
        let timeout_ms: u64 = parse_or(&lookup, "STORE_TIMEOUT_MS", 5_000)?;
        let busy_timeout_ms: u64 = parse_or(&lookup, "DATABASE_BUSY_TIMEOUT_MS", 5_000)?;
        let store = StoreConfig::new(&url)
            .with_max_connections(max_connections)
            .with_op_timeout(StdDuration::from_millis(timeout_ms))
            .with_busy_timeout(StdDuration::from_millis(busy_timeout_ms));

        Ok(Self {
            discord_token,
            guild_id: parse_opt(&lookup, "SERVER_ID")?,
            owner_id: parse_opt(&lookup, "OWNER_ID")?,
            prefix: lookup("COMMAND_PREFIX")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "!".to_string()),
            store,
            economy: EconomySettings {
                name: lookup("ECONOMY_NAME").unwrap_or(defaults.name),
                starting_balance,
                work_cooldown: Duration::hours(cooldown_hours),
            },
        })
    }
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn parse_opt<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, raw)),
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}
