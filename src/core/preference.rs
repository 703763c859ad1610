//! Preference storage and the theme setting.
//!
//! Preferences are plain key-value strings in the `preferences` table. The theme is the
//! only user-visible setting; the remaining keys are one-time markers.

use crate::{
    entities::{Preference, preference},
    errors::Result,
};
use sea_orm::{Set, prelude::*};
use std::fmt;
use std::str::FromStr;

/// Key under which the theme is stored.
pub const THEME_KEY: &str = "theme";

/// Retrieves the value stored under `key`, if any.
pub async fn get_preference<C>(db: &C, key: &str) -> Result<Option<String>>
where
    C: ConnectionTrait,
{
    let found = Preference::find_by_id(key.to_string()).one(db).await?;
    Ok(found.map(|p| p.value))
}

/// Stores `value` under `key`, replacing any previous value.
pub async fn set_preference<C>(db: &C, key: &str, value: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().naive_utc();

    let existing = Preference::find_by_id(key.to_string()).one(db).await?;
    if let Some(pref) = existing {
        let mut active_model: preference::ActiveModel = pref.into();
        active_model.value = Set(value.to_string());
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_pref = preference::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now),
        };
        new_pref.insert(db).await?;
    }

    Ok(())
}

/// Display theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Always light
    Light,
    /// Always dark
    Dark,
    /// Follow the client
    #[default]
    System,
}

impl Theme {
    /// All themes, in display order.
    pub const ALL: [Self; 3] = [Self::Light, Self::Dark, Self::System];

    /// The stored name of this theme.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    /// Accent color used for embeds rendered under this theme.
    #[must_use]
    pub const fn accent_color(self) -> u32 {
        match self {
            Self::Light => 0x0034_98DB,
            Self::Dark => 0x002C_3E50,
            Self::System => 0x0058_65F2,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            "system" => Ok(Self::System),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

/// Reads the stored theme. Missing or unrecognized values read as [`Theme::System`].
pub async fn get_theme<C>(db: &C) -> Result<Theme>
where
    C: ConnectionTrait,
{
    let stored = get_preference(db, THEME_KEY).await?;
    Ok(stored
        .and_then(|value| value.parse().ok())
        .unwrap_or_default())
}

/// Persists the theme.
pub async fn set_theme<C>(db: &C, theme: Theme) -> Result<()>
where
    C: ConnectionTrait,
{
    set_preference(db, THEME_KEY, theme.as_str()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn test_get_missing_preference() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(get_preference(&db, "nothing").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_preference_updates_existing() -> Result<()> {
        let db = setup_test_db().await?;

        set_preference(&db, "k", "one").await?;
        set_preference(&db, "k", "two").await?;

        assert_eq!(get_preference(&db, "k").await?.as_deref(), Some("two"));
        assert_eq!(Preference::find().count(&db).await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_theme_defaults_to_system() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(get_theme(&db).await?, Theme::System);

        // Garbage in storage still reads as System
        set_preference(&db, THEME_KEY, "sepia").await?;
        assert_eq!(get_theme(&db).await?, Theme::System);
        Ok(())
    }

    #[tokio::test]
    async fn test_theme_round_trip() -> Result<()> {
        let db = setup_test_db().await?;

        set_theme(&db, Theme::Dark).await?;
        assert_eq!(get_theme(&db).await?, Theme::Dark);
        assert_eq!(get_preference(&db, THEME_KEY).await?.as_deref(), Some("dark"));
        Ok(())
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Light".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!(" DARK ".parse::<Theme>(), Ok(Theme::Dark));
        assert!("blue".parse::<Theme>().is_err());
    }
}
