//! Subscription business logic - Handles all subscription data access.
//!
//! Provides functions for creating, retrieving, updating and deleting subscriptions, plus
//! the aggregate spend query and the roll-forward of past-due billing dates. Validation of
//! raw input happens before these functions are called; see [`crate::core::validation`].

use crate::{
    core::validation::SubscriptionDraft,
    entities::{Subscription, subscription},
    errors::{Error, Result},
};
use chrono::{Datelike, Months, NaiveDate};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use tracing::debug;

/// Inserts a new subscription from a validated draft.
pub async fn create_subscription<C>(db: &C, draft: &SubscriptionDraft) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().naive_utc();

    let subscription = subscription::ActiveModel {
        name: Set(draft.name.clone()),
        price: Set(draft.price),
        color: Set(draft.color.clone()),
        next_billing_date: Set(draft.next_billing_date),
        billing_day: Set(day_of(draft.next_billing_date)),
        category: Set(draft.category.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    subscription.insert(db).await.map_err(Into::into)
}

/// Finds a subscription by its unique ID.
pub async fn get_subscription_by_id<C>(
    db: &C,
    subscription_id: i64,
) -> Result<Option<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find_by_id(subscription_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every subscription, soonest billing date first, then by name.
pub async fn get_all_subscriptions<C>(db: &C) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .order_by_asc(subscription::Column::NextBillingDate)
        .order_by_asc(subscription::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the subscriptions whose category field equals `category`, ordered by name.
pub async fn get_subscriptions_by_category<C>(
    db: &C,
    category: &str,
) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    Subscription::find()
        .filter(subscription::Column::Category.eq(category))
        .order_by_asc(subscription::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds every subscription whose name matches `name`, ignoring case.
///
/// Names are not unique, so this can return several rows.
pub async fn find_subscriptions_by_name<C>(db: &C, name: &str) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    let wanted = name.trim().to_lowercase();
    let all = get_all_subscriptions(db).await?;
    Ok(all
        .into_iter()
        .filter(|sub| sub.name.to_lowercase() == wanted)
        .collect())
}

/// Resolves a user reference to exactly one subscription.
///
/// A numeric reference (optionally prefixed with `#`) is treated as an id first;
/// otherwise, or when no row has that id, the reference is matched against names.
/// Several matches are reported as ambiguous.
pub async fn resolve_subscription<C>(db: &C, reference: &str) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    if let Ok(id) = reference.trim().trim_start_matches('#').parse::<i64>() {
        if let Some(found) = get_subscription_by_id(db, id).await? {
            return Ok(found);
        }
    }

    let mut matches = find_subscriptions_by_name(db, reference).await?;
    match matches.len() {
        0 => Err(Error::SubscriptionNotFound {
            reference: reference.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(Error::AmbiguousSubscription {
            name: reference.trim().to_string(),
            ids: matches
                .iter()
                .map(|sub| sub.id.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Replaces every editable field of an existing subscription.
pub async fn update_subscription<C>(
    db: &C,
    subscription_id: i64,
    draft: &SubscriptionDraft,
) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    let existing = get_subscription_by_id(db, subscription_id)
        .await?
        .ok_or_else(|| Error::SubscriptionNotFound {
            reference: subscription_id.to_string(),
        })?;
    let date_changed = existing.next_billing_date != draft.next_billing_date;
    let mut subscription: subscription::ActiveModel = existing.into();

    subscription.name = Set(draft.name.clone());
    subscription.price = Set(draft.price);
    subscription.color = Set(draft.color.clone());
    if date_changed {
        subscription.next_billing_date = Set(draft.next_billing_date);
        subscription.billing_day = Set(day_of(draft.next_billing_date));
    }
    subscription.category = Set(draft.category.clone());
    subscription.updated_at = Set(chrono::Utc::now().naive_utc());

    subscription.update(db).await.map_err(Into::into)
}

/// Moves a single subscription to another category.
pub async fn update_subscription_category<C>(
    db: &C,
    subscription_id: i64,
    category: &str,
) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    let mut subscription: subscription::ActiveModel = get_subscription_by_id(db, subscription_id)
        .await?
        .ok_or_else(|| Error::SubscriptionNotFound {
            reference: subscription_id.to_string(),
        })?
        .into();

    subscription.category = Set(category.to_string());
    subscription.updated_at = Set(chrono::Utc::now().naive_utc());

    subscription.update(db).await.map_err(Into::into)
}

/// Re-points every subscription of category `from` to category `to`.
///
/// Returns the number of rows changed.
pub async fn reassign_category<C>(db: &C, from: &str, to: &str) -> Result<u64>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let result = Subscription::update_many()
        .col_expr(subscription::Column::Category, Expr::value(to))
        .col_expr(
            subscription::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(subscription::Column::Category.eq(from))
        .exec(db)
        .await?;

    Ok(result.rows_affected)
}

/// Deletes a subscription and returns the removed row.
pub async fn delete_subscription<C>(db: &C, subscription_id: i64) -> Result<subscription::Model>
where
    C: ConnectionTrait,
{
    let existing = get_subscription_by_id(db, subscription_id)
        .await?
        .ok_or_else(|| Error::SubscriptionNotFound {
            reference: subscription_id.to_string(),
        })?;

    Subscription::delete_by_id(subscription_id).exec(db).await?;
    Ok(existing)
}

/// Sums the monthly price of every subscription with a single aggregate query.
pub async fn total_monthly_spend<C>(db: &C) -> Result<f64>
where
    C: ConnectionTrait,
{
    let total: Option<Option<f64>> = Subscription::find()
        .select_only()
        .column_as(subscription::Column::Price.sum(), "total")
        .into_tuple::<Option<f64>>()
        .one(db)
        .await?;

    Ok(total.flatten().unwrap_or(0.0))
}

fn day_of(date: NaiveDate) -> i32 {
    i32::try_from(date.day()).unwrap_or(1)
}

/// The billing date inside the month containing `month` for a subscription that bills on
/// `anchor_day`, clamped to the last day of short months.
#[must_use]
pub fn billing_date_in_month(month: NaiveDate, anchor_day: u32) -> NaiveDate {
    let first = month.with_day(1).unwrap_or(month);
    let last_day = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(28, |last| last.day());
    first.with_day(anchor_day.clamp(1, last_day)).unwrap_or(first)
}

/// Returns the first monthly billing date on or after `today`.
///
/// Each step lands on `anchor_day` of the following month, so a clamped date does not pull
/// later months with it (Jan 31 -> Feb 28 -> Mar 31).
#[must_use]
pub fn next_billing_on_or_after(
    billing_date: NaiveDate,
    anchor_day: u32,
    today: NaiveDate,
) -> NaiveDate {
    if billing_date >= today {
        return billing_date;
    }

    let mut months = 1;
    loop {
        match billing_date.checked_add_months(Months::new(months)) {
            Some(month) => {
                let next = billing_date_in_month(month, anchor_day);
                if next >= today {
                    return next;
                }
                months += 1;
            }
            None => return billing_date,
        }
    }
}

/// Rolls forward every subscription whose next billing date lies before `today`.
///
/// Returns the rows that were changed.
pub async fn advance_past_due<C>(db: &C, today: NaiveDate) -> Result<Vec<subscription::Model>>
where
    C: ConnectionTrait,
{
    let past_due = Subscription::find()
        .filter(subscription::Column::NextBillingDate.lt(today))
        .all(db)
        .await?;

    let mut advanced = Vec::with_capacity(past_due.len());
    for sub in past_due {
        let next = next_billing_on_or_after(sub.next_billing_date, sub.anchor_day(), today);
        debug!(
            "Advancing '{}' billing date {} -> {}",
            sub.name, sub.next_billing_date, next
        );

        let mut active: subscription::ActiveModel = sub.into();
        active.next_billing_date = Set(next);
        active.updated_at = Set(chrono::Utc::now().naive_utc());
        advanced.push(active.update(db).await?);
    }

    Ok(advanced)
}
