//! General Discord commands - ping and help.
//! These commands don't touch the database and are available without signing in.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{bot::Context, errors::Result};

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: Context<'_>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: Context<'_>) -> Result<()> {
        let help_text = "**SubTrack Help**\n\
        Track your recurring subscriptions, their categories and what they cost.\n\n\
        **Subscriptions**\n\
        • `/subscription add <name> <price> <category> <next_billing_date> [color]` - Adds a subscription.\n\
        • `/subscription edit <subscription> [fields...]` - Changes a subscription.\n\
        • `/subscription delete <subscription>` - Removes a subscription.\n\
        • `/subscription list [category]` - Lists subscriptions, soonest billing first.\n\
        • `/subscription info <subscription>` - Shows one subscription.\n\n\
        **Categories**\n\
        • `/category add <name> <budget> [icon] [description] [gradient]` - Adds a category.\n\
        • `/category edit <category> [fields...]` - Changes (or renames) a category.\n\
        • `/category delete <category>` - Removes a category **and its subscriptions**.\n\
        • `/category list` - Lists categories with their counts and totals.\n\
        • `/category info <category>` - Shows one category.\n\n\
        **Overview**\n\
        • `/summary` - Monthly and yearly spend, upcoming renewals.\n\
        • `/analytics` - Distribution, budgets, timeline and statistics.\n\n\
        **Settings**\n\
        • `/theme [theme]` - Shows or sets the theme (light, dark, system).\n\
        • `/account signin|signup|signout|status` - Manages your account.\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.\n\n\
        Prices and budgets use up to two decimals (e.g. `9.99`), dates use `YYYY-MM-DD`.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
