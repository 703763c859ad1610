//! Discord command implementations organized by screen.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Account commands (sign in, sign up, sign out)
pub mod account;

/// Category management commands
pub mod category;

/// General utility commands
pub mod general;

/// Summary and analytics views
pub mod overview;

/// Theme preference command
pub mod settings;

/// Subscription management commands
pub mod subscription;

use crate::{bot::BotData, errors::Error};

// Export commands
pub use account::account_command;
pub use category::category_command;
pub use general::*;
pub use overview::*;
pub use settings::*;
pub use subscription::subscription_command;

/// Room left in an embed description.
pub const DESCRIPTION_LIMIT: usize = 4000;
/// Room left in an embed field value.
pub const FIELD_LIMIT: usize = 1000;
/// Discord allows at most this many fields per embed.
pub const MAX_FIELDS: usize = 25;

/// Every command the bot registers.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    vec![
        subscription_command(),
        category_command(),
        summary(),
        analytics(),
        theme(),
        account_command(),
        ping(),
        help(),
    ]
}

/// Joins lines with newlines, stopping before `limit` characters and noting how many
/// lines were left out.
pub fn bounded_lines(lines: impl IntoIterator<Item = String>, limit: usize) -> String {
    let lines: Vec<String> = lines.into_iter().collect();
    let mut out = String::new();

    for (shown, line) in lines.iter().enumerate() {
        let remaining = lines.len() - shown;
        let separator = usize::from(!out.is_empty());
        // Room for the note only matters while lines are left after this one
        let reserve = match remaining - 1 {
            0 => 0,
            after => format!("\n…and {after} more").len(),
        };
        if out.len() + separator + line.len() + reserve > limit {
            let more = format!("\n…and {remaining} more");
            let more = if out.is_empty() { more.trim_start() } else { more.as_str() };
            out.push_str(more);
            return out;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }

    out
}
