//! Subscription entity - A recurring payment tracked by the user.
//!
//! Each subscription has a monthly price, a display color, the date it next bills and the
//! name of the category it belongs to. The category link is by name only and is not a
//! database constraint; the category delete path removes matching rows itself.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Unique identifier for the subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Netflix", "Spotify")
    pub name: String,
    /// Monthly price, never negative
    pub price: f64,
    /// Display color as `#RRGGBB`
    pub color: String,
    /// Date of the next charge
    pub next_billing_date: Date,
    /// Day of month the subscription bills on, as entered by the user. Months shorter
    /// than this bill on their last day.
    pub billing_day: i32,
    /// Name of the owning category
    pub category: String,
    /// When the subscription was created
    pub created_at: DateTime,
    /// When the subscription was last modified
    pub updated_at: DateTime,
}

/// Subscriptions reference categories by name only
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The billing day as a calendar day, falling back to the day of the next charge.
    #[must_use]
    pub fn anchor_day(&self) -> u32 {
        u32::try_from(self.billing_day)
            .ok()
            .filter(|day| (1..=31).contains(day))
            .unwrap_or_else(|| chrono::Datelike::day(&self.next_billing_date))
    }
}
