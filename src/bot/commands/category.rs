//! Category Discord commands - add, edit, delete, list and info.
//!
//! Counts and totals are never stored; the list view reads them from the latest snapshot.
//! Deleting a category also deletes every subscription in it.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            Context,
            commands::{FIELD_LIMIT, MAX_FIELDS, bounded_lines},
            gradient_color,
            handlers::autocomplete,
        },
        core::{
            category as cats,
            subscription as subs,
            summary::{
                calculate_usage, format_currency, format_progress_bar, format_subscription_line,
            },
            validation::CategoryForm,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Icon used when the user does not pick one.
    const DEFAULT_ICON: &str = "📦";

    /// Manage subscription categories.
    #[poise::command(
        slash_command,
        rename = "category",
        subcommands("add", "edit", "delete", "list", "info"),
        subcommand_required
    )]
    pub async fn category_command(_ctx: Context<'_>) -> Result<()> {
        Ok(())
    }

    /// Adds a new category.
    #[poise::command(slash_command)]
    async fn add(
        ctx: Context<'_>,
        #[description = "Name of the category"] name: String,
        #[description = "Monthly budget, e.g. 50.00"] budget: String,
        #[description = "Display icon (default 📦)"] icon: Option<String>,
        #[description = "Short description"] description: Option<String>,
        #[description = "Color palette 0-5 (default 0)"]
        #[min = 0]
        #[max = 5]
        gradient: Option<i32>,
    ) -> Result<()> {
        let form = CategoryForm {
            name,
            icon: icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            budget,
            description: description.unwrap_or_default(),
            gradient_index: gradient.unwrap_or(0),
        };

        let created = ctx.data().store.add_category(&form).await?;

        ctx.say(format!(
            "✅ Created category {} **{}** with a {}/mo budget.",
            created.icon,
            created.name,
            format_currency(created.budget)
        ))
        .await?;
        Ok(())
    }

    /// Edits a category. Renaming moves its subscriptions along with it.
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command)]
    async fn edit(
        ctx: Context<'_>,
        #[description = "Category to edit"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
        #[description = "New name"] name: Option<String>,
        #[description = "New monthly budget"] budget: Option<String>,
        #[description = "New icon"] icon: Option<String>,
        #[description = "New description"] description: Option<String>,
        #[description = "New color palette 0-5"]
        #[min = 0]
        #[max = 5]
        gradient: Option<i32>,
    ) -> Result<()> {
        let store = &ctx.data().store;
        let existing = cats::get_category_by_name(store.db(), &category)
            .await?
            .ok_or(Error::CategoryNotFound { name: category })?;

        let form = CategoryForm {
            name: name.unwrap_or_else(|| existing.name.clone()),
            icon: icon.unwrap_or_else(|| existing.icon.clone()),
            budget: budget.unwrap_or_else(|| format!("{:.2}", existing.budget)),
            description: description.unwrap_or_else(|| existing.description.clone()),
            gradient_index: gradient.unwrap_or(existing.gradient_index),
        };

        let updated = store.update_category(&existing.name, &form).await?;

        let renamed = if updated.name == existing.name {
            String::new()
        } else {
            format!(" (renamed from {})", existing.name)
        };
        ctx.say(format!(
            "✅ Updated category {} **{}**{renamed}.",
            updated.icon, updated.name
        ))
        .await?;
        Ok(())
    }

    /// Deletes a category and every subscription in it.
    #[poise::command(slash_command)]
    async fn delete(
        ctx: Context<'_>,
        #[description = "Category to delete"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
    ) -> Result<()> {
        let deletion = ctx.data().store.delete_category(&category).await?;

        let removed = deletion.removed_subscription_ids.len();
        ctx.say(format!(
            "🗑️ Deleted category **{}** and {removed} subscription{}.",
            deletion.category.name,
            if removed == 1 { "" } else { "s" }
        ))
        .await?;
        Ok(())
    }

    /// Lists every category with its subscription count, total and budget.
    #[poise::command(slash_command)]
    async fn list(ctx: Context<'_>) -> Result<()> {
        let snapshot = ctx.data().state.snapshot();
        let breakdown = &snapshot.categories.breakdown;

        if breakdown.categories.is_empty() {
            ctx.say("🗂️ No categories yet. Create one with `/category add`.")
                .await?;
            return Ok(());
        }

        let mut fields = Vec::new();
        for summary in &breakdown.categories {
            let cat = &summary.category;
            let mut value = String::new();
            writeln!(
                &mut value,
                "**{}** subscription{} | {}/mo",
                summary.count,
                if summary.count == 1 { "" } else { "s" },
                format_currency(summary.total)
            )?;
            if cat.budget > 0.0 {
                let usage = calculate_usage(summary.total, cat.budget);
                write!(
                    &mut value,
                    "Budget {} {}",
                    format_currency(cat.budget),
                    format_progress_bar(usage, Some(10))
                )?;
            } else {
                value.push_str("_No budget_");
            }
            fields.push((format!("{} {}", cat.icon, cat.name), value, false));
        }
        fields.truncate(MAX_FIELDS);

        let mut embed = serenity::CreateEmbed::default()
            .title("🗂️ Categories")
            .color(ctx.data().accent_color())
            .fields(fields);

        if breakdown.uncategorized_count > 0 {
            embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
                "{} subscription(s) without a matching category | {}/mo",
                breakdown.uncategorized_count,
                format_currency(breakdown.uncategorized_total)
            )));
        }

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows one category and its subscriptions.
    #[poise::command(slash_command)]
    async fn info(
        ctx: Context<'_>,
        #[description = "Category to show"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
    ) -> Result<()> {
        let db = ctx.data().store.db();
        let cat = cats::get_category_by_name(db, &category)
            .await?
            .ok_or(Error::CategoryNotFound { name: category })?;
        let subscriptions = subs::get_subscriptions_by_category(db, &cat.name).await?;

        let total: f64 = subscriptions.iter().map(|sub| sub.price).sum();
        let usage = calculate_usage(total, cat.budget);

        let description = if cat.description.is_empty() {
            "_No description_".to_string()
        } else {
            cat.description.clone()
        };
        let listing = if subscriptions.is_empty() {
            "_No subscriptions_".to_string()
        } else {
            bounded_lines(subscriptions.iter().map(format_subscription_line), FIELD_LIMIT)
        };

        let embed = serenity::CreateEmbed::default()
            .title(format!("{} {}", cat.icon, cat.name))
            .description(description)
            .color(gradient_color(cat.gradient_index))
            .field("Count", subscriptions.len().to_string(), true)
            .field("Monthly total", format_currency(total), true)
            .field("Budget", format_currency(cat.budget), true)
            .field("Usage", format_progress_bar(usage, Some(15)), false)
            .field("Subscriptions", listing, false);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export the top-level command
pub use inner::category_command;
