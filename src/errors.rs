//! Unified error type for `SubTrack`.
//!
//! Every fallible operation in the crate returns [`Result`]. Validation failures carry a
//! static, user-facing message that the bot layer replies with verbatim; everything else
//! is logged and reported as a generic failure.

use thiserror::Error;

/// All errors that can occur in `SubTrack`.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// A form field was rejected; the message is shown to the user as-is
    #[error("{message}")]
    Validation {
        /// Static message describing the rejected field
        message: String,
    },

    /// No subscription matched the given id or name
    #[error("Subscription not found: {reference}")]
    SubscriptionNotFound {
        /// The id or name that was looked up
        reference: String,
    },

    /// Several subscriptions share the requested name
    #[error("Several subscriptions are named '{name}' (ids: {ids}). Use the id instead.")]
    AmbiguousSubscription {
        /// The requested name
        name: String,
        /// Comma separated ids of the candidates
        ids: String,
    },

    /// No category matched the given name
    #[error("Category not found: {name}")]
    CategoryNotFound {
        /// The requested category name
        name: String,
    },

    /// A category with the same name (ignoring case) already exists
    #[error("A category named '{name}' already exists")]
    DuplicateCategory {
        /// The clashing name
        name: String,
    },

    /// Sign in / sign up failed; the message comes from the fixed auth message table
    #[error("{message}")]
    Auth {
        /// User-facing message
        message: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// HTTP transport error talking to the identity provider
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or malformed environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// String formatting error while building a reply
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Serenity/Poise framework error
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Builds a validation error from a static message.
    #[must_use]
    pub fn validation(message: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
        }
    }

    /// Returns true if this error should be shown to the user verbatim.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::SubscriptionNotFound { .. }
                | Self::AmbiguousSubscription { .. }
                | Self::CategoryNotFound { .. }
                | Self::DuplicateCategory { .. }
                | Self::Auth { .. }
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
