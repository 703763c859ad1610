//! Preference entity - Key-value pairs for user settings and one-time markers.
//! Holds the theme and the default-category seeding marker.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Preference database model - stores key-value pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "preferences")]
pub struct Model {
    /// Preference key (e.g., `"theme"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Value stored as string
    pub value: String,
    /// When this preference was last modified
    pub updated_at: DateTime,
}

/// `Preference` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
