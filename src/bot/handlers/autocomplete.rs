//! Autocomplete handlers for Discord slash command parameters.
//!
//! Suggests subscription and category names from the database as the user types.

use crate::{
    bot::Context,
    core::{category, subscription},
};

/// Discord shows at most this many suggestions.
const MAX_SUGGESTIONS: usize = 25;

fn matching_names(names: impl Iterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();

    let mut matching: Vec<String> = names
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .collect();

    // Sort alphabetically for consistent UX
    matching.sort();
    matching.dedup();
    matching.truncate(MAX_SUGGESTIONS);
    matching
}

/// Provides autocomplete suggestions for subscription names.
pub async fn autocomplete_subscription(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(subscriptions) = subscription::get_all_subscriptions(ctx.data().store.db()).await
    else {
        return Vec::new();
    };

    matching_names(subscriptions.into_iter().map(|sub| sub.name), partial)
}

/// Provides autocomplete suggestions for category names.
pub async fn autocomplete_category(ctx: Context<'_>, partial: &str) -> Vec<String> {
    let Ok(categories) = category::get_all_categories(ctx.data().store.db()).await else {
        return Vec::new();
    };

    matching_names(categories.into_iter().map(|cat| cat.name), partial)
}
