//! Shared test utilities for `SubTrack`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

#![allow(clippy::expect_used)]

use crate::{
    core::{
        category, subscription,
        validation::{CategoryDraft, SubscriptionDraft},
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date.
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// A subscription draft with sensible defaults.
///
/// # Defaults
/// * `color`: `"#3498DB"`
/// * `next_billing_date`: 2030-01-15
#[must_use]
pub fn test_subscription_draft(name: &str, price: f64, category: &str) -> SubscriptionDraft {
    SubscriptionDraft {
        name: name.to_string(),
        price,
        color: "#3498DB".to_string(),
        next_billing_date: date(2030, 1, 15),
        category: category.to_string(),
    }
}

/// Creates a test subscription with sensible defaults.
pub async fn create_test_subscription(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    category: &str,
) -> Result<entities::subscription::Model> {
    subscription::create_subscription(db, &test_subscription_draft(name, price, category)).await
}

/// Creates a test subscription with a specific next billing date.
pub async fn create_custom_subscription(
    db: &DatabaseConnection,
    name: &str,
    price: f64,
    category: &str,
    next_billing_date: NaiveDate,
) -> Result<entities::subscription::Model> {
    let mut draft = test_subscription_draft(name, price, category);
    draft.next_billing_date = next_billing_date;
    subscription::create_subscription(db, &draft).await
}

/// A category draft with sensible defaults.
///
/// # Defaults
/// * `icon`: `"📦"`
/// * `budget`: 50.0
/// * `description`: empty
/// * `gradient_index`: 0
#[must_use]
pub fn test_category_draft(name: &str) -> CategoryDraft {
    CategoryDraft {
        name: name.to_string(),
        icon: "📦".to_string(),
        budget: 50.0,
        description: String::new(),
        gradient_index: 0,
    }
}

/// Creates a test category with sensible defaults.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    category::create_category(db, &test_category_draft(name)).await
}

/// Builds a subscription model without touching the database.
#[must_use]
pub fn subscription_model(
    id: i64,
    name: &str,
    price: f64,
    category: &str,
    next_billing_date: NaiveDate,
) -> entities::subscription::Model {
    let stamp = date(2024, 1, 1).and_hms_opt(0, 0, 0).expect("valid test time");
    entities::subscription::Model {
        id,
        name: name.to_string(),
        price,
        color: "#3498DB".to_string(),
        next_billing_date,
        billing_day: i32::try_from(chrono::Datelike::day(&next_billing_date)).unwrap_or(1),
        category: category.to_string(),
        created_at: stamp,
        updated_at: stamp,
    }
}

/// Builds a category model without touching the database.
#[must_use]
pub fn category_model(name: &str, budget: f64) -> entities::category::Model {
    entities::category::Model {
        name: name.to_string(),
        icon: "📦".to_string(),
        budget,
        description: String::new(),
        gradient_index: 0,
    }
}
