//! Settings Discord commands - the theme preference.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, core::preference::Theme, errors::Result};

    /// Theme choices offered in the slash command picker.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum ThemeChoice {
        #[name = "Light"]
        Light,
        #[name = "Dark"]
        Dark,
        #[name = "System"]
        System,
    }

    impl From<ThemeChoice> for Theme {
        fn from(choice: ThemeChoice) -> Self {
            match choice {
                ThemeChoice::Light => Self::Light,
                ThemeChoice::Dark => Self::Dark,
                ThemeChoice::System => Self::System,
            }
        }
    }

    /// Shows the current theme, or switches to another one.
    #[poise::command(slash_command, prefix_command)]
    pub async fn theme(
        ctx: Context<'_>,
        #[description = "Theme to switch to"] theme: Option<ThemeChoice>,
    ) -> Result<()> {
        let Some(choice) = theme else {
            let current = ctx.data().state.theme();
            let options: Vec<&str> = Theme::ALL.iter().map(|t| t.as_str()).collect();
            ctx.say(format!(
                "🎨 Current theme: **{current}** (options: {})",
                options.join(", ")
            ))
            .await?;
            return Ok(());
        };

        let selected = Theme::from(choice);
        ctx.data().store.set_theme(selected).await?;
        ctx.say(format!("🎨 Theme set to **{selected}**.")).await?;
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_theme_choice_maps_to_theme() {
            assert_eq!(Theme::from(ThemeChoice::Light), Theme::Light);
            assert_eq!(Theme::from(ThemeChoice::Dark), Theme::Dark);
            assert_eq!(Theme::from(ThemeChoice::System), Theme::System);
        }
    }
}

// Re-export all commands
pub use inner::*;
