//! Subscription Discord commands - add, edit, delete, list and info.
//!
//! Every write goes through the store, which validates the raw text fields and keeps
//! reminders in step. Validation failures come back as user-facing errors and are
//! answered by the framework error handler.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context,
            commands::{DESCRIPTION_LIMIT, bounded_lines},
            handlers::autocomplete,
        },
        core::{
            category,
            subscription as subs,
            summary::{days_until, format_currency, format_subscription_line},
            validation::SubscriptionForm,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Color used when the user does not pick one.
    const DEFAULT_COLOR: &str = "#3498DB";

    fn parse_hex_color(color: &str) -> Option<u32> {
        u32::from_str_radix(color.trim_start_matches('#'), 16).ok()
    }

    /// Manage your subscriptions.
    #[poise::command(
        slash_command,
        rename = "subscription",
        subcommands("add", "edit", "delete", "list", "info"),
        subcommand_required
    )]
    pub async fn subscription_command(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Adds a new subscription.
    #[poise::command(slash_command)]
    async fn add(
        ctx: Context<'_>,
        #[description = "Name of the subscription"] name: String,
        #[description = "Monthly price, e.g. 9.99"] price: String,
        #[description = "Category it belongs to"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
        #[description = "Next billing date (YYYY-MM-DD)"] next_billing_date: String,
        #[description = "Color as #RRGGBB (default #3498DB)"] color: Option<String>,
    ) -> Result<()> {
        let form = SubscriptionForm {
            name,
            price,
            color: color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            next_billing_date,
            category,
        };

        let created = ctx.data().store.add_subscription(&form).await?;

        ctx.say(format!(
            "✅ Added **{}** ({}/mo) to **{}**, next billing on {}. `#{}`",
            created.name,
            format_currency(created.price),
            created.category,
            created.next_billing_date.format("%Y-%m-%d"),
            created.id
        ))
        .await?;
        Ok(())
    }

    /// Edits an existing subscription. Fields left empty keep their value.
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command)]
    async fn edit(
        ctx: Context<'_>,
        #[description = "Subscription name or #id"]
        #[autocomplete = "autocomplete::autocomplete_subscription"]
        subscription: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New monthly price"] price: Option<String>,
        #[description = "New category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
        #[description = "New next billing date (YYYY-MM-DD)"] next_billing_date: Option<String>,
        #[description = "New color as #RRGGBB"] color: Option<String>,
    ) -> Result<()> {
        let store = &ctx.data().store;
        let existing = subs::resolve_subscription(store.db(), &subscription).await?;

        let form = SubscriptionForm {
            name: name.unwrap_or_else(|| existing.name.clone()),
            price: price.unwrap_or_else(|| format!("{:.2}", existing.price)),
            color: color.unwrap_or_else(|| existing.color.clone()),
            next_billing_date: next_billing_date
                .unwrap_or_else(|| existing.next_billing_date.format("%Y-%m-%d").to_string()),
            category: category.unwrap_or_else(|| existing.category.clone()),
        };

        let updated = store.update_subscription(existing.id, &form).await?;

        ctx.say(format!("✅ Updated {}", format_subscription_line(&updated)))
            .await?;
        Ok(())
    }

    /// Deletes a subscription.
    #[poise::command(slash_command)]
    async fn delete(
        ctx: Context<'_>,
        #[description = "Subscription name or #id"]
        #[autocomplete = "autocomplete::autocomplete_subscription"]
        subscription: String,
    ) -> Result<()> {
        let store = &ctx.data().store;
        let existing = subs::resolve_subscription(store.db(), &subscription).await?;
        let deleted = store.delete_subscription(existing.id).await?;

        ctx.say(format!("🗑️ Deleted **{}**.", deleted.name)).await?;
        Ok(())
    }

    /// Lists subscriptions, soonest billing first.
    #[poise::command(slash_command)]
    async fn list(
        ctx: Context<'_>,
        #[description = "Only show this category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
    ) -> Result<()> {
        let db = ctx.data().store.db();

        let (title, subscriptions) = match category {
            Some(name) => {
                let owner = category::get_category_by_name(db, &name)
                    .await?
                    .ok_or(Error::CategoryNotFound { name })?;
                let mut found = subs::get_subscriptions_by_category(db, &owner.name).await?;
                found.sort_by_key(|sub| sub.next_billing_date);
                (format!("{} {}", owner.icon, owner.name), found)
            }
            None => (
                "📋 All Subscriptions".to_string(),
                subs::get_all_subscriptions(db).await?,
            ),
        };

        if subscriptions.is_empty() {
            ctx.say("📋 No subscriptions yet. Add one with `/subscription add`.")
                .await?;
            return Ok(());
        }

        let total: f64 = subscriptions.iter().map(|sub| sub.price).sum();
        let lines = subscriptions.iter().map(format_subscription_line);

        let embed = serenity::CreateEmbed::default()
            .title(title)
            .description(bounded_lines(lines, DESCRIPTION_LIMIT))
            .color(ctx.data().accent_color())
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{} subscription{} | {}/mo",
                subscriptions.len(),
                if subscriptions.len() == 1 { "" } else { "s" },
                format_currency(total)
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows the details of one subscription.
    #[poise::command(slash_command)]
    async fn info(
        ctx: Context<'_>,
        #[description = "Subscription name or #id"]
        #[autocomplete = "autocomplete::autocomplete_subscription"]
        subscription: String,
    ) -> Result<()> {
        let db = ctx.data().store.db();
        let sub = subs::resolve_subscription(db, &subscription).await?;
        let owner = category::get_category_by_name(db, &sub.category).await?;

        let today = chrono::Utc::now().date_naive();
        let days = days_until(sub.next_billing_date, today);
        let due = match days {
            0 => "today".to_string(),
            1 => "tomorrow".to_string(),
            d if d > 1 => format!("in {d} days"),
            d => format!("{} days ago", -d),
        };

        let category_label = owner.map_or_else(
            || format!("{} (missing)", sub.category),
            |cat| format!("{} {}", cat.icon, cat.name),
        );

        let embed = serenity::CreateEmbed::default()
            .title(format!("📌 {}", sub.name))
            .color(parse_hex_color(&sub.color).unwrap_or_else(|| ctx.data().accent_color()))
            .field("Monthly", format_currency(sub.price), true)
            .field("Yearly", format_currency(sub.price * 12.0), true)
            .field("Category", category_label, true)
            .field(
                "Next billing",
                format!("{} ({due})", sub.next_billing_date.format("%Y-%m-%d")),
                false,
            )
            .footer(serenity::CreateEmbedFooter::new(format!(
                "#{} | color {}",
                sub.id, sub.color
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

}

// Re-export the top-level command
pub use inner::subscription_command;
