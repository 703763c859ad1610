//! Category business logic - Handles all category-related operations.
//!
//! Category names are the identifier and are compared without regard to case when
//! checking for duplicates and when looking a category up. Renaming a category re-points
//! its subscriptions; deleting one removes its subscriptions in the same transaction.

use crate::{
    config::categories::CategoryConfig,
    core::{preference, subscription as subscription_ops, validation::CategoryDraft},
    entities::{Category, Subscription, category, subscription},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Marker preference recording that the default set has been seeded.
pub const SEEDED_MARKER_KEY: &str = "default_categories_seeded";

/// What a category delete removed.
#[derive(Debug, Clone)]
pub struct CategoryDeletion {
    /// The deleted category
    pub category: category::Model,
    /// Ids of the subscriptions removed along with it
    pub removed_subscription_ids: Vec<i64>,
}

/// Retrieves all categories, ordered alphabetically by name.
pub async fn get_all_categories<C>(db: &C) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by name, ignoring case.
pub async fn get_category_by_name<C>(db: &C, name: &str) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    let wanted = name.trim().to_lowercase();
    let all = get_all_categories(db).await?;
    Ok(all.into_iter().find(|c| c.name.to_lowercase() == wanted))
}

/// Creates a category from a validated draft, rejecting a case-insensitive duplicate name.
pub async fn create_category<C>(db: &C, draft: &CategoryDraft) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    if get_category_by_name(db, &draft.name).await?.is_some() {
        return Err(Error::DuplicateCategory {
            name: draft.name.clone(),
        });
    }

    let category = category::ActiveModel {
        name: Set(draft.name.clone()),
        icon: Set(draft.icon.clone()),
        budget: Set(draft.budget),
        description: Set(draft.description.clone()),
        gradient_index: Set(draft.gradient_index),
    };

    category.insert(db).await.map_err(Into::into)
}

/// Replaces every field of the category currently named `current_name`.
///
/// When the name changes, every subscription of the old name moves with it. The new name
/// must not clash with another category.
pub async fn update_category(
    db: &DatabaseConnection,
    current_name: &str,
    draft: &CategoryDraft,
) -> Result<category::Model> {
    use sea_orm::sea_query::Expr;

    let existing = get_category_by_name(db, current_name)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            name: current_name.to_string(),
        })?;

    let renamed = existing.name != draft.name;
    if renamed {
        if let Some(clash) = get_category_by_name(db, &draft.name).await? {
            if clash.name != existing.name {
                return Err(Error::DuplicateCategory {
                    name: draft.name.clone(),
                });
            }
        }
    }

    let txn = db.begin().await?;

    Category::update_many()
        .col_expr(category::Column::Name, Expr::value(draft.name.clone()))
        .col_expr(category::Column::Icon, Expr::value(draft.icon.clone()))
        .col_expr(category::Column::Budget, Expr::value(draft.budget))
        .col_expr(
            category::Column::Description,
            Expr::value(draft.description.clone()),
        )
        .col_expr(
            category::Column::GradientIndex,
            Expr::value(draft.gradient_index),
        )
        .filter(category::Column::Name.eq(existing.name.as_str()))
        .exec(&txn)
        .await?;

    if renamed {
        let moved = subscription_ops::reassign_category(&txn, &existing.name, &draft.name).await?;
        debug!(
            "Renamed category '{}' -> '{}', moved {moved} subscriptions",
            existing.name, draft.name
        );
    }

    let updated = Category::find_by_id(draft.name.clone())
        .one(&txn)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            name: draft.name.clone(),
        })?;

    txn.commit().await?;
    Ok(updated)
}

/// Deletes a category together with every subscription that references it.
///
/// Both deletes run in one transaction: either the category and all its subscriptions are
/// gone, or nothing changed.
pub async fn delete_category(db: &DatabaseConnection, name: &str) -> Result<CategoryDeletion> {
    let txn = db.begin().await?;

    let category = get_category_by_name(&txn, name)
        .await?
        .ok_or_else(|| Error::CategoryNotFound {
            name: name.to_string(),
        })?;

    let removed_subscription_ids: Vec<i64> =
        subscription_ops::get_subscriptions_by_category(&txn, &category.name)
            .await?
            .into_iter()
            .map(|sub| sub.id)
            .collect();

    Subscription::delete_many()
        .filter(subscription::Column::Category.eq(category.name.as_str()))
        .exec(&txn)
        .await?;
    Category::delete_by_id(category.name.clone())
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        "Deleted category '{}' and {} subscriptions",
        category.name,
        removed_subscription_ids.len()
    );
    Ok(CategoryDeletion {
        category,
        removed_subscription_ids,
    })
}

/// Seeds the default category set the first time it is called against a database.
///
/// Later calls are no-ops even if every category has since been deleted. Defaults whose
/// name already exists are skipped. Returns the number of categories inserted.
pub async fn seed_default_categories(
    db: &DatabaseConnection,
    defaults: &[CategoryConfig],
) -> Result<usize> {
    if preference::get_preference(db, SEEDED_MARKER_KEY)
        .await?
        .is_some()
    {
        debug!("Default categories already seeded");
        return Ok(0);
    }

    let txn = db.begin().await?;
    let mut inserted = 0;

    for default in defaults {
        if get_category_by_name(&txn, &default.name).await?.is_some() {
            continue;
        }

        category::ActiveModel {
            name: Set(default.name.trim().to_string()),
            icon: Set(default.icon.clone()),
            budget: Set(default.budget),
            description: Set(default.description.clone()),
            gradient_index: Set(default.gradient_index),
        }
        .insert(&txn)
        .await?;
        inserted += 1;
    }

    preference::set_preference(&txn, SEEDED_MARKER_KEY, "true").await?;
    txn.commit().await?;

    info!("Seeded {inserted} default categories");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::config::categories::builtin_categories;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_category() -> Result<()> {
        let db = setup_test_db().await?;

        let created = create_test_category(&db, "Music").await?;
        assert_eq!(created.name, "Music");
        assert_eq!(created.budget, 50.0);

        let found = get_category_by_name(&db, "music").await?.unwrap();
        assert_eq!(found, created);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_category_rejects_case_insensitive_duplicate() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_category(&db, "Music").await?;
        let result = create_test_category(&db, "MUSIC").await;
        assert!(matches!(result, Err(Error::DuplicateCategory { .. })));

        assert_eq!(get_all_categories(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_all_categories_sorted() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_category(&db, "Music").await?;
        create_test_category(&db, "Entertainment").await?;

        let names: Vec<String> = get_all_categories(&db)
            .await?
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Entertainment", "Music"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_category_fields() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_category(&db, "Music").await?;
        let mut draft = test_category_draft("Music");
        draft.budget = 25.0;
        draft.description = "Audio".to_string();

        let updated = update_category(&db, "music", &draft).await?;
        assert_eq!(updated.budget, 25.0);
        assert_eq!(updated.description, "Audio");
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_category_moves_subscriptions() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_category(&db, "Music").await?;
        create_test_subscription(&db, "Spotify", 9.99, "Music").await?;
        create_test_subscription(&db, "Tidal", 10.99, "Music").await?;

        let updated = update_category(&db, "Music", &test_category_draft("Audio")).await?;
        assert_eq!(updated.name, "Audio");

        assert!(get_category_by_name(&db, "Music").await?.is_none());
        let moved = subscription_ops::get_subscriptions_by_category(&db, "Audio").await?;
        assert_eq!(moved.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_category_clash() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_category(&db, "Music").await?;
        create_test_category(&db, "Audio").await?;

        let result = update_category(&db, "Music", &test_category_draft("audio")).await;
        assert!(matches!(result, Err(Error::DuplicateCategory { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_category_case_only() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_category(&db, "music").await?;
        let updated = update_category(&db, "music", &test_category_draft("Music")).await?;
        assert_eq!(updated.name, "Music");
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_category_cascades_to_subscriptions() -> Result<()> {
        let db = setup_test_db().await?;

        create_test_category(&db, "Music").await?;
        create_test_category(&db, "Entertainment").await?;
        let spotify = create_test_subscription(&db, "Spotify", 9.99, "Music").await?;
        let tidal = create_test_subscription(&db, "Tidal", 10.99, "Music").await?;
        let netflix = create_test_subscription(&db, "Netflix", 15.99, "Entertainment").await?;

        let deletion = delete_category(&db, "Music").await?;
        let mut removed = deletion.removed_subscription_ids;
        removed.sort_unstable();
        assert_eq!(removed, vec![spotify.id, tidal.id]);

        let remaining = subscription_ops::get_all_subscriptions(&db).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, netflix.id);
        assert!(get_category_by_name(&db, "Music").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_category() -> Result<()> {
        let db = setup_test_db().await?;
        let result = delete_category(&db, "Nope").await;
        assert!(matches!(result, Err(Error::CategoryNotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_default_categories_runs_once() -> Result<()> {
        let db = setup_test_db().await?;
        let defaults = builtin_categories();

        let inserted = seed_default_categories(&db, &defaults).await?;
        assert_eq!(inserted, defaults.len());
        assert_eq!(get_all_categories(&db).await?.len(), defaults.len());

        // Deleting everything does not trigger a reseed
        for cat in get_all_categories(&db).await? {
            delete_category(&db, &cat.name).await?;
        }
        assert_eq!(seed_default_categories(&db, &defaults).await?, 0);
        assert!(get_all_categories(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_skips_existing_names() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_category(&db, "music").await?;

        let defaults = builtin_categories();
        let inserted = seed_default_categories(&db, &defaults).await?;
        assert_eq!(inserted, defaults.len() - 1);
        Ok(())
    }
}
