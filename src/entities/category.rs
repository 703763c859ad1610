//! Category entity - A user-defined grouping of subscriptions with a monthly budget.
//!
//! The name is the identifier. Subscription count and total are derived from the
//! subscriptions table whenever they are needed and are not stored here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Category name, also the primary key
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    /// Display icon (an emoji)
    pub icon: String,
    /// Monthly budget for all subscriptions in this category
    pub budget: f64,
    /// Free-text description
    pub description: String,
    /// Index into the gradient palette used when rendering the category
    pub gradient_index: i32,
}

/// `Category` has no database-level relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
