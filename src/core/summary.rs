//! Spend aggregation and display formatting.
//!
//! This module re-shapes the subscription list for display: monthly and yearly totals,
//! per-category count and total, upcoming renewals, and the text helpers the bot layer
//! uses to render amounts and progress. All functions are pure and framework-agnostic.

use crate::entities::{category, subscription};
use chrono::NaiveDate;
use std::collections::HashMap;

/// A category together with the figures derived from its subscriptions.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    /// The category row
    pub category: category::Model,
    /// Number of subscriptions whose category field equals the category name
    pub count: usize,
    /// Sum of their monthly prices
    pub total: f64,
}

/// Result of grouping subscriptions by category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryBreakdown {
    /// One entry per category, in the order the categories were given
    pub categories: Vec<CategorySummary>,
    /// Subscriptions whose category matches no known category
    pub uncategorized_count: usize,
    /// Sum of their monthly prices
    pub uncategorized_total: f64,
}

/// Sum of monthly prices.
#[must_use]
pub fn monthly_total(subscriptions: &[subscription::Model]) -> f64 {
    subscriptions.iter().map(|sub| sub.price).sum()
}

/// Monthly total projected over a year.
#[must_use]
pub fn yearly_total(subscriptions: &[subscription::Model]) -> f64 {
    monthly_total(subscriptions) * 12.0
}

/// Groups subscriptions by category in one pass over the subscription list.
#[must_use]
pub fn summarize_categories(
    categories: &[category::Model],
    subscriptions: &[subscription::Model],
) -> CategoryBreakdown {
    let mut totals: HashMap<&str, (usize, f64)> = categories
        .iter()
        .map(|cat| (cat.name.as_str(), (0, 0.0)))
        .collect();

    let mut uncategorized_count = 0;
    let mut uncategorized_total = 0.0;

    for sub in subscriptions {
        if let Some((count, total)) = totals.get_mut(sub.category.as_str()) {
            *count += 1;
            *total += sub.price;
        } else {
            uncategorized_count += 1;
            uncategorized_total += sub.price;
        }
    }

    let categories = categories
        .iter()
        .map(|cat| {
            let (count, total) = totals.get(cat.name.as_str()).copied().unwrap_or((0, 0.0));
            CategorySummary {
                category: cat.clone(),
                count,
                total,
            }
        })
        .collect();

    CategoryBreakdown {
        categories,
        uncategorized_count,
        uncategorized_total,
    }
}

/// Subscriptions billing between `today` and `today + within_days` inclusive, soonest first.
#[must_use]
pub fn upcoming_renewals(
    subscriptions: &[subscription::Model],
    today: NaiveDate,
    within_days: i64,
) -> Vec<subscription::Model> {
    let horizon = today + chrono::Duration::days(within_days);
    let mut upcoming: Vec<subscription::Model> = subscriptions
        .iter()
        .filter(|sub| sub.next_billing_date >= today && sub.next_billing_date <= horizon)
        .cloned()
        .collect();
    upcoming.sort_by(|a, b| {
        a.next_billing_date
            .cmp(&b.next_billing_date)
            .then_with(|| a.name.cmp(&b.name))
    });
    upcoming
}

/// Days from `today` until `date`; negative when `date` has passed.
#[must_use]
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    date.signed_duration_since(today).num_days()
}

/// Formats an amount as `$12.34`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${amount:.2}")
    }
}

/// Calculates what share of `limit` has been used, as a percentage.
///
/// Returns 0 when `limit` is 0 rather than dividing by zero.
#[must_use]
pub fn calculate_usage(used: f64, limit: f64) -> f64 {
    if limit == 0.0 {
        return 0.0;
    }

    (used / limit) * 100.0
}

/// Generates a progress bar string for visual representation.
///
/// Creates a text-based progress bar like: `[████████░░] 80.0%`
///
/// # Arguments
/// * `progress_percent` - Progress percentage (0-100, clamped for the bar only)
/// * `bar_length` - Length of the progress bar in characters (default 10)
#[must_use]
pub fn format_progress_bar(progress_percent: f64, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped_progress = progress_percent.clamp(0.0, 100.0);

    // clamped_progress is in [0, 100] and length is small, so the cast cannot overflow.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((clamped_progress / 100.0) * length as f64).round() as usize;
    let empty = length.saturating_sub(filled);

    let filled_str = "█".repeat(filled);
    let empty_str = "░".repeat(empty);

    format!("[{filled_str}{empty_str}] {progress_percent:.1}%")
}

/// One-line description of a subscription for lists.
#[must_use]
pub fn format_subscription_line(sub: &subscription::Model) -> String {
    format!(
        "`#{}` **{}** - {}/mo | {} | next {}",
        sub.id,
        sub.name,
        format_currency(sub.price),
        sub.category,
        sub.next_billing_date.format("%Y-%m-%d")
    )
}
