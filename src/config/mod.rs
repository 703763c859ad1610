/// Database configuration and connection management
pub mod database;

/// Default category set loaded from config.toml
pub mod categories;

/// Runtime settings from environment variables
pub mod settings;
