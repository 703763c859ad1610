//! Database configuration module for `SubTrack`.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models.
//! Creation is idempotent, which lets the bot reuse an existing database file.

use crate::entities::{Category, Preference, Subscription};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Default database location, relative to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/subtrack.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the default.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the `SQLite` database named by `DATABASE_URL`.
///
/// When the default location is used, the `data/` directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if database_url == DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }

    debug!("Connecting to database at {database_url}");
    let db = Database::connect(&database_url).await?;
    info!("Database connection established");
    Ok(db)
}

/// Creates every table that does not exist yet, using `SeaORM`'s schema generation.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    create_table(db, Subscription).await?;
    create_table(db, Category).await?;
    create_table(db, Preference).await?;
    debug!("Database tables ensured");
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}
