//! Runtime settings read from environment variables.
//!
//! Everything here is optional with sensible defaults, so the bot can start with only a
//! `DISCORD_BOT_TOKEN`. Malformed numeric values are configuration errors rather than
//! being silently replaced by defaults.

use crate::errors::{Error, Result};
use std::str::FromStr;

/// Default Identity Toolkit compatible endpoint.
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// When and where renewal reminders are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderSettings {
    /// Discord channel that receives reminders; reminders are only logged when unset
    pub channel_id: Option<u64>,
    /// How many days before the billing date the reminder fires
    pub days_before: u32,
    /// Hour of day (UTC) the reminder fires
    pub hour_utc: u32,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            channel_id: None,
            days_before: 1,
            hour_utc: 9,
        }
    }
}

/// Identity provider connection details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentitySettings {
    /// API key sent with every request
    pub api_key: String,
    /// Base URL of the REST endpoint
    pub base_url: String,
}

/// All runtime settings.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Reminder delivery settings
    pub reminders: ReminderSettings,
    /// Identity provider; sign-in is not required when this is `None`
    pub identity: Option<IdentitySettings>,
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ReminderSettings::default();
        let reminders = ReminderSettings {
            channel_id: parse_optional(&lookup, "REMINDER_CHANNEL_ID")?,
            days_before: parse_optional(&lookup, "REMINDER_DAYS_BEFORE")?
                .unwrap_or(defaults.days_before),
            hour_utc: parse_optional(&lookup, "REMINDER_HOUR_UTC")?.unwrap_or(defaults.hour_utc),
        };

        if reminders.hour_utc > 23 {
            return Err(Error::Config {
                message: format!("REMINDER_HOUR_UTC must be 0-23, got {}", reminders.hour_utc),
            });
        }

        let identity = lookup("IDENTITY_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| IdentitySettings {
                api_key,
                base_url: lookup("IDENTITY_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_IDENTITY_BASE_URL.to_string()),
            });

        Ok(Self {
            reminders,
            identity,
        })
    }
}

fn parse_optional<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| Error::Config {
                message: format!("Invalid value for {key}: {e}"),
            })
        })
        .transpose()
}
