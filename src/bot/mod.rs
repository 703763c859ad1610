//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `SubTrack`: the slash commands that
//! stand in for the app screens, autocomplete handlers, the optional sign-in gate, and the
//! task that delivers renewal reminders to a channel.

/// Discord command implementations (subscription, category, overview, settings, account, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    auth::{AuthSessions, RestIdentityProvider},
    config::settings::Settings,
    core::validation::GRADIENT_COUNT,
    errors::{Error, Result},
    reminders::{ReminderDue, reminder_message, resolve_due},
    state::AppState,
    store::Store,
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

/// Shorthand for the poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Embed colors for the category gradient palette, indexed by `gradient_index`.
pub const GRADIENT_COLORS: [u32; GRADIENT_COUNT as usize] = [
    0x0066_7EEA,
    0x00F0_93FB,
    0x004F_ACFE,
    0x0043_E97B,
    0x00FA_709A,
    0x0030_CFD0,
];

/// Embed color for a category's gradient index, falling back to the first entry.
#[must_use]
pub fn gradient_color(index: i32) -> u32 {
    usize::try_from(index)
        .ok()
        .and_then(|i| GRADIENT_COLORS.get(i).copied())
        .unwrap_or(GRADIENT_COLORS[0])
}

/// Shared data available to all bot commands.
pub struct BotData {
    /// Repository for every write
    pub store: Arc<Store>,
    /// Latest derived views and the theme
    pub state: AppState,
    /// Per-user sign-in sessions; `None` when no identity provider is configured
    pub sessions: Option<AuthSessions<RestIdentityProvider>>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        store: Arc<Store>,
        state: AppState,
        sessions: Option<AuthSessions<RestIdentityProvider>>,
    ) -> Self {
        Self {
            store,
            state,
            sessions,
        }
    }

    /// Embed color for the current theme.
    #[must_use]
    pub fn accent_color(&self) -> u32 {
        self.state.theme().accent_color()
    }
}

/// Commands that stay available without a signed-in session.
const OPEN_COMMANDS: [&str; 3] = ["account", "ping", "help"];

/// Global command check: when accounts are enabled, everything except the open commands
/// needs a signed-in session.
async fn require_session(ctx: Context<'_>) -> Result<bool> {
    let Some(sessions) = &ctx.data().sessions else {
        return Ok(true);
    };

    let root = ctx
        .parent_commands()
        .first()
        .map_or_else(|| ctx.command().name.as_str(), |parent| parent.name.as_str());
    if OPEN_COMMANDS.contains(&root) {
        return Ok(true);
    }

    Ok(sessions.is_signed_in(ctx.author().id.get()))
}

async fn reply_ephemeral(ctx: Context<'_>, text: String) {
    if let Err(e) = ctx
        .send(poise::CreateReply::default().content(text).ephemeral(true))
        .await
    {
        error!("Failed to send error message: {e}");
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            if error.is_user_facing() {
                reply_ephemeral(ctx, format!("❌ {error}")).await;
            } else {
                error!("Error in command `{}`: {error:?}", ctx.command().qualified_name);
                reply_ephemeral(ctx, "❌ Something went wrong. Please try again.".to_string())
                    .await;
            }
        }
        poise::FrameworkError::CommandCheckFailed {
            error: None, ctx, ..
        } => {
            reply_ephemeral(
                ctx,
                "🔒 Please sign in first with `/account signin` (or create an account with `/account signup`).".to_string(),
            )
            .await;
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Delivers fired reminders to `channel` until the scheduler goes away.
///
/// Each reminder reloads its subscription through [`resolve_due`]; reminders for deleted
/// subscriptions are dropped. With no channel configured the reminder is only logged.
pub async fn deliver_reminders(
    http: Arc<serenity::Http>,
    store: Arc<Store>,
    channel: Option<serenity::ChannelId>,
    mut receiver: mpsc::UnboundedReceiver<ReminderDue>,
) {
    while let Some(due) = receiver.recv().await {
        let Some(sub) = resolve_due(store.db(), due).await else {
            continue;
        };

        let text = reminder_message(&sub, chrono::Utc::now().date_naive());
        let Some(channel) = channel else {
            info!("Reminder (no channel configured): {text}");
            continue;
        };

        if let Err(e) = channel.say(http.as_ref(), text).await {
            warn!("Failed to deliver reminder for {}: {e}", sub.name);
        }
    }
}

/// Builds the poise framework and runs the Discord client until it stops.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    settings: Settings,
    store: Arc<Store>,
    state: AppState,
    reminders: mpsc::UnboundedReceiver<ReminderDue>,
) -> Result<()> {
    let sessions = match &settings.identity {
        Some(identity) => {
            info!("Identity provider configured, sign-in required for data commands");
            Some(AuthSessions::new(RestIdentityProvider::new(identity)?))
        }
        None => None,
    };
    let reminder_channel = settings.reminders.channel_id.map(serenity::ChannelId::new);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            on_error: |error| Box::pin(on_error(error)),
            command_check: Some(|ctx| Box::pin(require_session(ctx))),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tokio::spawn(deliver_reminders(
                    Arc::clone(&ctx.http),
                    Arc::clone(&store),
                    reminder_channel,
                    reminders,
                ));

                Ok(BotData::new(store, state, sessions))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}
