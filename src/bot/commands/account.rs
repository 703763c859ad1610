//! Account Discord commands - sign in, sign up, sign out and status.
//!
//! Replies are ephemeral since they carry an email address. When no identity provider
//! is configured the bot is open and these commands only say so.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        auth::{AuthSessions, RestIdentityProvider},
        bot::Context,
        errors::Result,
    };

    async fn reply(ctx: Context<'_>, text: String) -> Result<()> {
        ctx.send(poise::CreateReply::default().content(text).ephemeral(true))
            .await?;
        Ok(())
    }

    async fn sessions_or_reply(
        ctx: Context<'_>,
    ) -> Result<Option<&AuthSessions<RestIdentityProvider>>> {
        let sessions = ctx.data().sessions.as_ref();
        if sessions.is_none() {
            reply(
                ctx,
                "ℹ️ Accounts are not enabled on this bot; every command is open.".to_string(),
            )
            .await?;
        }
        Ok(sessions)
    }

    /// Manage your account.
    #[poise::command(
        slash_command,
        rename = "account",
        subcommands("signin", "signup", "signout", "status"),
        subcommand_required
    )]
    pub async fn account_command(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Signs in with email and password.
    #[poise::command(slash_command, ephemeral)]
    async fn signin(
        ctx: Context<'_>,
        #[description = "Email address"] email: String,
        #[description = "Password"] password: String,
    ) -> Result<()> {
        let Some(sessions) = sessions_or_reply(ctx).await? else {
            return Ok(());
        };

        let user = sessions
            .session(ctx.author().id.get())
            .sign_in(&email, &password)
            .await?;
        reply(ctx, format!("✅ Signed in as **{}**.", user.email)).await
    }

    /// Creates an account and signs it in.
    #[poise::command(slash_command, ephemeral)]
    async fn signup(
        ctx: Context<'_>,
        #[description = "Email address"] email: String,
        #[description = "Password (at least 6 characters)"] password: String,
    ) -> Result<()> {
        let Some(sessions) = sessions_or_reply(ctx).await? else {
            return Ok(());
        };

        let user = sessions
            .session(ctx.author().id.get())
            .sign_up(&email, &password)
            .await?;
        reply(ctx, format!("✅ Account created for **{}**.", user.email)).await
    }

    /// Signs out.
    #[poise::command(slash_command, ephemeral)]
    async fn signout(ctx: Context<'_>) -> Result<()> {
        let Some(sessions) = sessions_or_reply(ctx).await? else {
            return Ok(());
        };

        sessions.session(ctx.author().id.get()).sign_out();
        reply(ctx, "👋 Signed out.".to_string()).await
    }

    /// Shows who you are signed in as.
    #[poise::command(slash_command, ephemeral)]
    async fn status(ctx: Context<'_>) -> Result<()> {
        let Some(sessions) = sessions_or_reply(ctx).await? else {
            return Ok(());
        };

        let state = sessions.session(ctx.author().id.get()).state();
        let text = match (&state.user, &state.error) {
            (Some(user), _) => format!("🔓 Signed in as **{}**.", user.email),
            (None, Some(error)) => format!("🔒 Not signed in. Last attempt: {error}"),
            (None, None) => "🔒 Not signed in.".to_string(),
        };
        reply(ctx, text).await
    }
}

// Re-export the top-level command
pub use inner::account_command;
