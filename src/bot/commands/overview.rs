//! Overview Discord commands - the home summary and the analytics view.
//!
//! Both read the latest snapshot published by the state holder, so they never touch the
//! database directly.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{Context, commands::{FIELD_LIMIT, bounded_lines}},
        core::summary::{days_until, format_currency, format_progress_bar},
        errors::Result,
        state::{TIMELINE_MONTHS, UPCOMING_WINDOW_DAYS},
    };
    use poise::serenity_prelude as serenity;
    use std::fmt::Write;

    /// Shows monthly and yearly spend and the renewals coming up this week.
    #[poise::command(slash_command, prefix_command)]
    pub async fn summary(ctx: Context<'_>) -> Result<()> {
        let snapshot = ctx.data().state.snapshot();
        let home = &snapshot.home;

        if home.subscriptions.is_empty() {
            ctx.say("📊 No subscriptions yet. Add one with `/subscription add` to get started!")
                .await?;
            return Ok(());
        }

        let upcoming = if home.upcoming.is_empty() {
            format!("_Nothing renews in the next {UPCOMING_WINDOW_DAYS} days_")
        } else {
            bounded_lines(
                home.upcoming.iter().map(|sub| {
                    let days = days_until(sub.next_billing_date, snapshot.today);
                    let when = match days {
                        0 => "today".to_string(),
                        1 => "tomorrow".to_string(),
                        d => format!("in {d} days"),
                    };
                    format!("• **{}** {} {when}", sub.name, format_currency(sub.price))
                }),
                FIELD_LIMIT,
            )
        };

        let mut categories = String::new();
        for summary in &snapshot.categories.breakdown.categories {
            if summary.count > 0 {
                writeln!(
                    &mut categories,
                    "{} {} - {} ({})",
                    summary.category.icon,
                    summary.category.name,
                    format_currency(summary.total),
                    summary.count
                )?;
            }
        }
        if categories.is_empty() {
            categories.push_str("_No spend in any category_");
        }

        let embed = serenity::CreateEmbed::default()
            .title("📊 Subscription Summary")
            .description(format!("As of {}", snapshot.today.format("%Y-%m-%d")))
            .color(ctx.data().accent_color())
            .field("Monthly", format_currency(home.monthly_total), true)
            .field("Yearly", format_currency(home.yearly_total), true)
            .field("Subscriptions", home.subscriptions.len().to_string(), true)
            .field("Upcoming renewals", upcoming, false)
            .field("By category", categories, false);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Shows spend distribution, budget usage, the renewal timeline and statistics.
    #[poise::command(slash_command, prefix_command)]
    pub async fn analytics(ctx: Context<'_>) -> Result<()> {
        let snapshot = ctx.data().state.snapshot();
        let analytics = &snapshot.analytics;

        let mut distribution = String::new();
        for slice in &analytics.distribution {
            writeln!(
                &mut distribution,
                "{} {} {} {}",
                slice.icon,
                slice.category,
                format_progress_bar(slice.share_percent, Some(10)),
                format_currency(slice.total)
            )?;
        }
        if distribution.is_empty() {
            distribution.push_str("_No spend yet_");
        }

        let mut budgets = String::new();
        for budget in analytics.budgets.iter().filter(|b| b.budget > 0.0) {
            let flag = if budget.over_budget { "🔴" } else { "🟢" };
            writeln!(
                &mut budgets,
                "{flag} {} {} of {} ({:.1}%)",
                budget.category,
                format_currency(budget.spent),
                format_currency(budget.budget),
                budget.usage_percent
            )?;
        }
        if budgets.is_empty() {
            budgets.push_str("_No budgets set_");
        }

        let mut timeline = String::new();
        for month in &analytics.timeline {
            writeln!(
                &mut timeline,
                "{} - {} ({} renewal{})",
                month.month.format("%b %Y"),
                format_currency(month.total),
                month.renewals,
                if month.renewals == 1 { "" } else { "s" }
            )?;
        }

        let stats = &analytics.stats;
        let mut headline = String::new();
        writeln!(&mut headline, "Subscriptions: **{}**", stats.count)?;
        writeln!(
            &mut headline,
            "Average price: **{}**",
            format_currency(stats.average_price)
        )?;
        if let Some((name, price)) = &stats.most_expensive {
            writeln!(&mut headline, "Most expensive: **{name}** {}", format_currency(*price))?;
        }
        if let Some((name, price)) = &stats.least_expensive {
            writeln!(&mut headline, "Cheapest: **{name}** {}", format_currency(*price))?;
        }

        let embed = serenity::CreateEmbed::default()
            .title("📈 Analytics")
            .color(ctx.data().accent_color())
            .field("Distribution", truncate(distribution), false)
            .field("Budgets", truncate(budgets), false)
            .field(
                format!("Next {TIMELINE_MONTHS} months"),
                truncate(timeline),
                false,
            )
            .field("Statistics", headline, false);

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Keeps a multi-line field value within the embed field limit.
    fn truncate(text: String) -> String {
        bounded_lines(text.lines().map(str::to_string), FIELD_LIMIT)
    }
}

// Re-export all commands
pub use inner::*;
